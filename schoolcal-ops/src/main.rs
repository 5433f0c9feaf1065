//! schoolcal-ops - batch maintenance CLI
//!
//! Out-of-band counterpart to schoolcal-api: bulk import/export, the
//! refinement sweep, flag reconciliation and record cleanup, all against
//! the shared SQLite database. Destructive commands are dry-run by default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use schoolcal_common::config::resolve_database_path;
use schoolcal_common::db::init_database;
use schoolcal_ops::commands::{
    export_csv, import, invalid_json, process_status, refine_sweep, remove_data, reset_flags,
    search, stats,
};

#[derive(Parser, Debug)]
#[command(name = "schoolcal-ops")]
#[command(about = "Batch maintenance commands for the UK school calendar tracker")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database (falls back to SCHOOLCAL_DB, then the
    /// platform data directory)
    #[arg(short, long, env = "SCHOOLCAL_DB", global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import schools from the establishment CSV (skips existing URNs)
    Import {
        /// Path to the CSV file to import
        csv_file: PathBuf,
        /// Set process=true for all imported schools
        #[arg(long)]
        process: bool,
    },
    /// Export refined calendar data to CSV
    ExportCsv {
        /// Output CSV file path
        output: PathBuf,
        /// Include schools without valid calendar data
        #[arg(long)]
        include_invalid: bool,
    },
    /// Refine every data record to the canonical calendar format
    Refine {
        /// Actually save the refined data (dry-run otherwise)
        #[arg(long)]
        save: bool,
        /// Delete records that cannot be refined (requires --save)
        #[arg(long, requires = "save")]
        delete_invalid: bool,
        /// Write the refined documents to a JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Reconcile the process flag against actual data state
    ProcessStatus {
        /// Actually update the flags (dry-run otherwise)
        #[arg(long)]
        update: bool,
        /// Also set process=false for schools without valid calendar data
        #[arg(long)]
        set_false: bool,
    },
    /// Reset downstream scraper flags for schools with no data records
    ResetScraperFlags {
        /// Actually reset the flags (dry-run otherwise)
        #[arg(long)]
        apply: bool,
    },
    /// Report record classification buckets and schools without data
    InvalidJson {
        /// Show only summary statistics
        #[arg(long)]
        summary_only: bool,
        /// Write the full report to a file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Search record payloads for a text pattern, optionally deleting matches
    Search {
        /// Text to search for
        text: String,
        /// Actually delete the matching records (dry-run otherwise)
        #[arg(long)]
        delete: bool,
        /// Case-sensitive search (case-insensitive by default)
        #[arg(long)]
        case_sensitive: bool,
        /// Write the match report to a file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Remove data records in bulk
    RemoveData {
        /// Delete all data records
        #[arg(long)]
        all: bool,
        /// Delete records for a specific school URN
        #[arg(long)]
        school_id: Option<i64>,
        /// Delete records containing known placeholder event text
        #[arg(long)]
        filter_unwanted_text: bool,
        /// Actually delete (dry-run otherwise)
        #[arg(long)]
        delete: bool,
    },
    /// Show workflow flag and record classification totals
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let db_path = resolve_database_path(cli.database.as_ref());
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    match cli.command {
        Command::Import { csv_file, process } => {
            let opts = import::ImportOptions { csv_file, process };
            let report = import::run(&pool, &opts).await?;
            report.print();
        }
        Command::ExportCsv {
            output,
            include_invalid,
        } => {
            let opts = export_csv::ExportOptions {
                output,
                include_invalid,
            };
            let report = export_csv::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::Refine {
            save,
            delete_invalid,
            out,
        } => {
            let opts = refine_sweep::RefineOptions {
                save,
                delete_invalid,
                out,
            };
            let report = refine_sweep::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::ProcessStatus { update, set_false } => {
            let opts = process_status::ProcessStatusOptions { update, set_false };
            let report = process_status::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::ResetScraperFlags { apply } => {
            let opts = reset_flags::ResetFlagsOptions { apply };
            let report = reset_flags::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::InvalidJson { summary_only, out } => {
            let opts = invalid_json::InvalidJsonOptions { summary_only, out };
            let report = invalid_json::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::Search {
            text,
            delete,
            case_sensitive,
            out,
        } => {
            let opts = search::SearchOptions {
                text,
                delete,
                case_sensitive,
                out,
            };
            let report = search::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::RemoveData {
            all,
            school_id,
            filter_unwanted_text,
            delete,
        } => {
            let opts = remove_data::RemoveDataOptions {
                all,
                school_id,
                filter_unwanted_text,
                delete,
            };
            let report = remove_data::run(&pool, &opts).await?;
            report.print(&opts);
        }
        Command::Stats => {
            let report = stats::run(&pool).await?;
            report.print();
        }
    }

    Ok(())
}
