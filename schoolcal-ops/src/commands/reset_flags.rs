//! Downstream-flag reset for schools with no data at all
//!
//! A school with zero records never ran validation; if its second or third
//! scraping stage is already flagged, the workflow state is a lie and gets
//! reset so the school restarts from scratch.

use anyhow::Result;
use sqlx::SqlitePool;

use schoolcal_common::calendar::needs_flag_reset;
use schoolcal_common::db::queries;

use super::{banner, print_limited};
use super::process_status::SchoolRef;

#[derive(Debug, Clone, Default)]
pub struct ResetFlagsOptions {
    /// Apply the resets (dry-run otherwise)
    pub apply: bool,
}

#[derive(Debug, Default)]
pub struct ResetFlagsReport {
    pub candidates: Vec<SchoolRef>,
    pub updated: usize,
}

pub async fn run(pool: &SqlitePool, opts: &ResetFlagsOptions) -> Result<ResetFlagsReport> {
    let without_records = queries::schools_without_records(pool).await?;

    let mut report = ResetFlagsReport::default();
    for school in without_records {
        if needs_flag_reset(0, school.second_scraper, school.third_scraper) {
            report.candidates.push(SchoolRef {
                urn: school.urn,
                name: school.establishment_name,
            });
        }
    }

    if opts.apply {
        let mut tx = pool.begin().await?;
        for school in &report.candidates {
            queries::reset_downstream_flags(&mut *tx, school.urn).await?;
            report.updated += 1;
        }
        tx.commit().await?;
    }

    Ok(report)
}

impl ResetFlagsReport {
    pub fn print(&self, opts: &ResetFlagsOptions) {
        banner("RESETTING SCRAPER FLAGS FOR SCHOOLS WITH NO DATA");
        if self.candidates.is_empty() {
            println!(
                "No schools need updating (all schools with no data already have \
                 second_scraper=false and third_scraper=false)."
            );
            return;
        }

        println!(
            "{} school(s) with no data records still show a scraper flag:",
            self.candidates.len()
        );
        print_limited(&self.candidates, |_, school| {
            format!("  URN {}: {}", school.urn, school.name)
        });

        if opts.apply {
            println!(
                "\nUpdated {} school(s): set second_scraper=false and third_scraper=false.",
                self.updated
            );
        } else {
            println!("\nThis was a dry run; re-run with --apply to reset the flags.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolcal_common::db::init_in_memory;
    use serde_json::json;

    async fn flagged_school(pool: &SqlitePool, urn: i64, name: &str) {
        queries::insert_school(pool, urn, name, "Camden", "Open", None, true)
            .await
            .unwrap();
        sqlx::query("UPDATE schools SET second_scraper = 1 WHERE urn = ?")
            .bind(urn)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn flagged_school_without_records_is_reset() {
        let pool = init_in_memory().await.unwrap();
        flagged_school(&pool, 100001, "Alpha Primary").await;

        let report = run(&pool, &ResetFlagsOptions { apply: true }).await.unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.updated, 1);

        let school = queries::get_school(&pool, 100001).await.unwrap().unwrap();
        assert!(!school.second_scraper);
        assert!(!school.third_scraper);
    }

    #[tokio::test]
    async fn schools_with_records_are_left_alone() {
        let pool = init_in_memory().await.unwrap();
        flagged_school(&pool, 100001, "Alpha Primary").await;
        queries::insert_record(&pool, 100001, &json!({"anything": 1}))
            .await
            .unwrap();

        let report = run(&pool, &ResetFlagsOptions { apply: true }).await.unwrap();
        assert!(report.candidates.is_empty());

        let school = queries::get_school(&pool, 100001).await.unwrap().unwrap();
        assert!(school.second_scraper);
    }

    #[tokio::test]
    async fn unflagged_schools_are_not_touched() {
        let pool = init_in_memory().await.unwrap();
        queries::insert_school(&pool, 100002, "Beta Academy", "Camden", "Open", None, false)
            .await
            .unwrap();

        let report = run(&pool, &ResetFlagsOptions::default()).await.unwrap();
        assert!(report.candidates.is_empty());
    }
}
