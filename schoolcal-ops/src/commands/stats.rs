//! Workflow dashboard counts
//!
//! The per-flag and per-classification totals the admin screens show.

use std::collections::BTreeMap;

use anyhow::Result;
use sqlx::SqlitePool;

use schoolcal_common::calendar::classify;
use schoolcal_common::db::queries::{self, FlagCounts};

use super::banner;

#[derive(Debug)]
pub struct StatsReport {
    pub flags: FlagCounts,
    pub records_total: usize,
    pub status_counts: BTreeMap<String, usize>,
}

pub async fn run(pool: &SqlitePool) -> Result<StatsReport> {
    let flags = queries::flag_counts(pool).await?;

    let entries = queries::all_records_with_schools(pool).await?;
    let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &entries {
        let status = classify(entry.record.data.as_ref());
        *status_counts.entry(status.to_string()).or_default() += 1;
    }

    Ok(StatsReport {
        flags,
        records_total: entries.len(),
        status_counts,
    })
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl StatsReport {
    pub fn print(&self) {
        banner("SCHOOLCAL STATS");
        let total = self.flags.total;
        println!("Total schools: {total}");

        for (label, set) in [
            ("process", self.flags.process),
            ("second_scraper", self.flags.second_scraper),
            ("third_scraper", self.flags.third_scraper),
        ] {
            println!(
                "  {label}: {} true ({:.1}%), {} false ({:.1}%)",
                set,
                percentage(set, total),
                total - set,
                percentage(total - set, total),
            );
        }

        println!("\nTotal data records: {}", self.records_total);
        for (label, count) in &self.status_counts {
            println!("  {label}: {count}");
        }
    }
}
