//! Text search (and optional delete) across record payloads
//!
//! The payload is serialized and matched as a plain substring,
//! case-insensitive unless asked otherwise. Deletion is opt-in and runs in
//! one transaction.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use sqlx::SqlitePool;

use schoolcal_common::db::queries;

use super::{banner, preview, print_limited};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub text: String,
    /// Delete the matching records (dry-run otherwise)
    pub delete: bool,
    pub case_sensitive: bool,
    /// Write the match report to a file
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MatchEntry {
    pub id: i64,
    pub urn: i64,
    pub school_name: String,
    pub local_authority: String,
    pub created_at: String,
    pub data_preview: String,
}

#[derive(Debug, Default)]
pub struct SearchReport {
    pub checked: usize,
    pub matches: Vec<MatchEntry>,
    pub deleted: usize,
}

/// Substring match over a serialized payload.
pub fn payload_matches(rendered: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        rendered.contains(needle)
    } else {
        rendered.to_lowercase().contains(&needle.to_lowercase())
    }
}

pub async fn run(pool: &SqlitePool, opts: &SearchOptions) -> Result<SearchReport> {
    let entries = queries::all_records_with_schools(pool).await?;

    let mut report = SearchReport {
        checked: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        // NULL payloads (absent or stored JSON null) have nothing to match
        let Some(data) = entry.record.data.as_ref().filter(|data| !data.is_null()) else {
            continue;
        };
        let rendered = data.to_string();
        if payload_matches(&rendered, &opts.text, opts.case_sensitive) {
            report.matches.push(MatchEntry {
                id: entry.record.id,
                urn: entry.record.school_urn,
                school_name: entry.school_name.clone(),
                local_authority: entry.local_authority.clone(),
                created_at: entry.record.created_at.clone(),
                data_preview: preview(&rendered, 500),
            });
        }
    }

    if opts.delete {
        let mut tx = pool.begin().await?;
        for matched in &report.matches {
            queries::delete_record(&mut *tx, matched.id).await?;
            report.deleted += 1;
        }
        tx.commit().await?;
    }

    if let Some(path) = &opts.out {
        std::fs::write(path, render_file_report(&report, opts))?;
    }

    Ok(report)
}

fn render_file_report(report: &SearchReport, opts: &SearchOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DATA RECORD SEARCH RESULTS");
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "Search Text: \"{}\"", opts.text);
    let _ = writeln!(out, "Case Sensitive: {}", opts.case_sensitive);
    let _ = writeln!(out, "Total Records Checked: {}", report.checked);
    let _ = writeln!(out, "Matching Records: {}", report.matches.len());
    let _ = writeln!(out);
    for (idx, matched) in report.matches.iter().enumerate() {
        let _ = writeln!(out, "[{}] Record ID: {}", idx + 1, matched.id);
        let _ = writeln!(out, "School URN: {}", matched.urn);
        let _ = writeln!(out, "School Name: {}", matched.school_name);
        let _ = writeln!(out, "Local Authority: {}", matched.local_authority);
        let _ = writeln!(out, "Created At: {}", matched.created_at);
        let _ = writeln!(out, "Data: {}", matched.data_preview);
        let _ = writeln!(out, "{}", "-".repeat(80));
    }
    out
}

impl SearchReport {
    pub fn print(&self, opts: &SearchOptions) {
        banner("SEARCHING DATA RECORDS FOR TEXT PATTERN");
        println!("Search Text: \"{}\"", opts.text);
        println!("Case Sensitive: {}", opts.case_sensitive);
        println!(
            "Mode: {}",
            if opts.delete { "DELETE" } else { "DRY RUN (preview only)" }
        );
        println!("Total records checked: {}", self.checked);
        println!("Matching records: {}", self.matches.len());

        if self.matches.is_empty() {
            println!("\nNo records found containing \"{}\"", opts.text);
            return;
        }

        println!("\nMATCHING RECORDS");
        print_limited(&self.matches, |idx, matched| {
            format!(
                "[{idx}] record {} URN {} {} ({}): {}",
                matched.id,
                matched.urn,
                matched.school_name,
                matched.local_authority,
                preview(&matched.data_preview, 120)
            )
        });

        if opts.delete {
            println!("\nDeleted {} records", self.deleted);
        } else {
            println!(
                "\nThis was a dry run; re-run with --delete to remove these {} records.",
                self.matches.len()
            );
        }
        if let Some(path) = &opts.out {
            println!("Report saved to: {}", path.display());
        }
    }
}
