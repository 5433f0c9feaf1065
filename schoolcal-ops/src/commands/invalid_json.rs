//! Classification report over every data record
//!
//! Buckets each record through the shared classifier and itemizes the ones
//! with no payload to speak of, plus the schools that never received any
//! record at all.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use sqlx::SqlitePool;

use schoolcal_common::calendar::{classify, DataStatus};
use schoolcal_common::db::queries;

use super::process_status::SchoolRef;
use super::{banner, preview, print_limited};

#[derive(Debug, Clone, Default)]
pub struct InvalidJsonOptions {
    /// Show only summary statistics, not detailed entries
    pub summary_only: bool,
    /// Write the full report to a file
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProblemEntry {
    pub id: i64,
    pub urn: i64,
    pub school_name: String,
    pub status: DataStatus,
    pub created_at: String,
    pub updated_at: String,
    pub data_preview: String,
}

#[derive(Debug, Default)]
pub struct InvalidJsonReport {
    pub total: usize,
    /// Record count per classification bucket (keyed by display label)
    pub counts: BTreeMap<String, usize>,
    /// NULL and EMPTY records, itemized
    pub problems: Vec<ProblemEntry>,
    pub schools_without_data: Vec<SchoolRef>,
}

pub async fn run(pool: &SqlitePool, opts: &InvalidJsonOptions) -> Result<InvalidJsonReport> {
    let entries = queries::all_records_with_schools(pool).await?;

    let mut report = InvalidJsonReport {
        total: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        let status = classify(entry.record.data.as_ref());
        *report.counts.entry(status.to_string()).or_default() += 1;

        if matches!(status, DataStatus::Null | DataStatus::Empty) {
            let rendered = entry
                .record
                .data
                .as_ref()
                .map(|data| data.to_string())
                .unwrap_or_else(|| "None".to_string());
            report.problems.push(ProblemEntry {
                id: entry.record.id,
                urn: entry.record.school_urn,
                school_name: entry.school_name.clone(),
                status,
                created_at: entry.record.created_at.clone(),
                updated_at: entry.record.updated_at.clone(),
                data_preview: preview(&rendered, 200),
            });
        }
    }

    report.schools_without_data = queries::schools_without_records(pool)
        .await?
        .into_iter()
        .map(|school| SchoolRef {
            urn: school.urn,
            name: school.establishment_name,
        })
        .collect();

    if let Some(path) = &opts.out {
        std::fs::write(path, render_file_report(&report))?;
    }

    Ok(report)
}

fn render_file_report(report: &InvalidJsonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DATA RECORD CLASSIFICATION REPORT");
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "Total records: {}", report.total);
    for (label, count) in &report.counts {
        let _ = writeln!(out, "  {label}: {count}");
    }
    let _ = writeln!(out);
    for entry in &report.problems {
        let _ = writeln!(out, "Record ID: {}", entry.id);
        let _ = writeln!(out, "School URN: {}", entry.urn);
        let _ = writeln!(out, "School Name: {}", entry.school_name);
        let _ = writeln!(out, "Created At: {}", entry.created_at);
        let _ = writeln!(out, "Updated At: {}", entry.updated_at);
        let _ = writeln!(out, "Data Status: {}", entry.status);
        let _ = writeln!(out, "Data Content: {}", entry.data_preview);
        let _ = writeln!(out, "{}", "-".repeat(80));
    }
    let _ = writeln!(
        out,
        "Schools without any data records: {}",
        report.schools_without_data.len()
    );
    for school in &report.schools_without_data {
        let _ = writeln!(out, "  URN: {}, Name: {}", school.urn, school.name);
    }
    out
}

impl InvalidJsonReport {
    pub fn print(&self, opts: &InvalidJsonOptions) {
        banner("DATA RECORD CLASSIFICATION");
        println!("Total data records: {}", self.total);
        for (label, count) in &self.counts {
            println!("  {label}: {count}");
        }

        if opts.summary_only {
            return;
        }

        if !self.problems.is_empty() {
            println!("\nNULL/EMPTY RECORDS");
            print_limited(&self.problems, |idx, entry| {
                format!(
                    "[{idx}] record {} URN {} {}: {} ({})",
                    entry.id, entry.urn, entry.school_name, entry.status, entry.data_preview
                )
            });
        } else {
            println!("\nNo NULL or EMPTY records found.");
        }

        if !self.schools_without_data.is_empty() {
            println!(
                "\nSCHOOLS WITHOUT ANY DATA RECORDS ({})",
                self.schools_without_data.len()
            );
            print_limited(&self.schools_without_data, |_, school| {
                format!("  URN: {}, Name: {}", school.urn, school.name)
            });
        }

        if let Some(path) = &opts.out {
            println!("\nReport saved to: {}", path.display());
        }
    }
}
