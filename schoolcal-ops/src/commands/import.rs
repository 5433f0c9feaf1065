//! Bulk CSV import of schools
//!
//! Consumes the national establishment CSV. Rows whose URN already exists
//! are skipped so the import can be re-run against updated exports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;

use schoolcal_common::db::queries;

use super::{banner, print_limited};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub csv_file: PathBuf,
    /// Set process=true for all imported schools
    pub process: bool,
}

#[derive(Debug, Clone)]
pub struct RowIssue {
    pub row: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: u64,
    pub skipped: u64,
    pub issues: Vec<RowIssue>,
}

pub async fn run(pool: &SqlitePool, opts: &ImportOptions) -> Result<ImportReport> {
    let text = read_csv_text(&opts.csv_file)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .context("Could not read CSV header")?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let Some(urn_col) = column("URN") else {
        bail!("CSV is missing the URN column");
    };
    let Some(name_col) = column("EstablishmentName") else {
        bail!("CSV is missing the EstablishmentName column");
    };
    let la_col = column("LA (name)");
    let status_col = column("EstablishmentStatus (name)");
    let website_col = column("SchoolWebsite");

    let mut existing: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT urn FROM schools")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    let mut report = ImportReport::default();
    let mut tx = pool.begin().await?;

    // Row 1 is the header
    for (idx, record) in reader.records().enumerate() {
        let row = idx as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.issues.push(RowIssue {
                    row,
                    reason: format!("Unreadable row: {e}"),
                });
                continue;
            }
        };

        let cell = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("").trim();

        let urn_text = cell(Some(urn_col));
        if urn_text.is_empty() {
            continue; // blank row
        }
        let Ok(urn) = urn_text.parse::<i64>() else {
            report.issues.push(RowIssue {
                row,
                reason: format!("Invalid URN \"{urn_text}\""),
            });
            continue;
        };

        if existing.contains(&urn) {
            report.skipped += 1;
            continue;
        }

        let establishment_name = cell(Some(name_col));
        if establishment_name.is_empty() {
            report.issues.push(RowIssue {
                row,
                reason: format!("Missing EstablishmentName for URN {urn}"),
            });
            continue;
        }

        let local_authority = non_empty_or(cell(la_col), "Unknown");
        let establishment_status = non_empty_or(cell(status_col), "Unknown");
        let website = cell(website_col);
        let website = (!website.is_empty()).then_some(website);

        queries::insert_school(
            &mut *tx,
            urn,
            establishment_name,
            local_authority,
            establishment_status,
            website,
            opts.process,
        )
        .await?;

        existing.insert(urn);
        report.created += 1;
    }

    tx.commit().await?;
    Ok(report)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Read a CSV file as text, tolerating the Latin-1 exports the
/// establishment data sometimes ships as.
fn read_csv_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        // Latin-1: every byte maps directly to the same code point
        Err(e) => Ok(e.into_bytes().iter().map(|&b| b as char).collect()),
    }
}

impl ImportReport {
    pub fn print(&self) {
        banner("IMPORT RESULTS");
        println!("Created: {} schools", self.created);
        println!("Skipped (already exist): {} schools", self.skipped);
        println!("Errors: {} rows", self.issues.len());
        print_limited(&self.issues, |_, issue| {
            format!("  Row {}: {}", issue.row, issue.reason)
        });
    }
}
