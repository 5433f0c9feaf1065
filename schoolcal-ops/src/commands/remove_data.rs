//! Bulk deletion of data records
//!
//! Targets one of: every record, one school's records, or records carrying
//! the placeholder phrases the extraction prompt sometimes echoes back
//! verbatim instead of real event text.

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use schoolcal_common::db::queries;

use super::{banner, print_limited};

/// Placeholder phrases from the prompt's output template; records carrying
/// them verbatim never contained real event descriptions.
pub const UNWANTED_TEXTS: [&str; 2] = [
    "FULL original event description exactly as written",
    "Original official event description",
];

#[derive(Debug, Clone, Default)]
pub struct RemoveDataOptions {
    /// Delete all data records
    pub all: bool,
    /// Delete records for one school URN
    pub school_id: Option<i64>,
    /// Delete records containing the known placeholder phrases
    pub filter_unwanted_text: bool,
    /// Actually delete (dry-run otherwise)
    pub delete: bool,
}

#[derive(Debug, Clone)]
pub struct TargetEntry {
    pub id: i64,
    pub urn: i64,
    pub school_name: String,
    pub created_at: String,
}

#[derive(Debug, Default)]
pub struct RemoveDataReport {
    pub target: String,
    pub targeted: Vec<TargetEntry>,
    pub deleted: usize,
}

pub async fn run(pool: &SqlitePool, opts: &RemoveDataOptions) -> Result<RemoveDataReport> {
    let selected = [opts.all, opts.school_id.is_some(), opts.filter_unwanted_text]
        .iter()
        .filter(|&&flag| flag)
        .count();
    if selected != 1 {
        bail!("Specify exactly one of --all, --school-id <urn>, or --filter-unwanted-text");
    }

    let entries = queries::all_records_with_schools(pool).await?;

    let mut report = RemoveDataReport::default();
    for entry in &entries {
        let wanted = if opts.all {
            true
        } else if let Some(urn) = opts.school_id {
            entry.record.school_urn == urn
        } else {
            contains_unwanted_text(entry.record.data.as_ref())
        };

        if wanted {
            report.targeted.push(TargetEntry {
                id: entry.record.id,
                urn: entry.record.school_urn,
                school_name: entry.school_name.clone(),
                created_at: entry.record.created_at.clone(),
            });
        }
    }

    report.target = if opts.all {
        "ALL data records".to_string()
    } else if let Some(urn) = opts.school_id {
        format!("data records for school URN {urn}")
    } else {
        "data records containing unwanted event description text".to_string()
    };

    if opts.delete {
        let mut tx = pool.begin().await?;
        for entry in &report.targeted {
            queries::delete_record(&mut *tx, entry.id).await?;
            report.deleted += 1;
        }
        tx.commit().await?;
    }

    Ok(report)
}

fn contains_unwanted_text(data: Option<&serde_json::Value>) -> bool {
    let Some(data) = data.filter(|data| !data.is_null()) else {
        return false;
    };
    let rendered = data.to_string().to_lowercase();
    UNWANTED_TEXTS
        .iter()
        .any(|text| rendered.contains(&text.to_lowercase()))
}

impl RemoveDataReport {
    pub fn print(&self, opts: &RemoveDataOptions) {
        banner("REMOVE DATA RECORDS");
        println!("Target: {}", self.target);
        println!(
            "Mode: {}",
            if opts.delete { "DELETE" } else { "DRY RUN (preview only)" }
        );
        println!("Total records targeted: {}", self.targeted.len());

        if self.targeted.is_empty() {
            println!("\nNo data records found to delete.");
            return;
        }

        println!("\nRecords to be deleted:");
        print_limited(&self.targeted, |_, entry| {
            format!(
                "  - ID: {}, School: {} (URN: {}), Created: {}",
                entry.id, entry.school_name, entry.urn, entry.created_at
            )
        });

        if opts.delete {
            println!("\nDeleted {} records", self.deleted);
        } else {
            println!("\nThis was a dry run; re-run with --delete to remove these records.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolcal_common::db::init_in_memory;
    use serde_json::json;

    async fn fixture_pool() -> SqlitePool {
        let pool = init_in_memory().await.unwrap();
        queries::insert_school(&pool, 100001, "Alpha Primary", "Camden", "Open", None, true)
            .await
            .unwrap();
        queries::insert_school(&pool, 100002, "Beta Academy", "Camden", "Open", None, true)
            .await
            .unwrap();
        queries::insert_record(&pool, 100001, &json!({"a": 1})).await.unwrap();
        queries::insert_record(&pool, 100002, &json!({"b": 2})).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn exactly_one_target_is_required() {
        let pool = fixture_pool().await;
        assert!(run(&pool, &RemoveDataOptions::default()).await.is_err());

        let opts = RemoveDataOptions {
            all: true,
            school_id: Some(100001),
            ..Default::default()
        };
        assert!(run(&pool, &opts).await.is_err());
    }

    #[tokio::test]
    async fn school_id_targets_one_school_only() {
        let pool = fixture_pool().await;
        let opts = RemoveDataOptions {
            school_id: Some(100001),
            delete: true,
            ..Default::default()
        };

        let report = run(&pool, &opts).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert!(queries::current_record(&pool, 100001).await.unwrap().is_none());
        assert!(queries::current_record(&pool, 100002).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dry_run_previews_all_without_deleting() {
        let pool = fixture_pool().await;
        let opts = RemoveDataOptions {
            all: true,
            ..Default::default()
        };

        let report = run(&pool, &opts).await.unwrap();
        assert_eq!(report.targeted.len(), 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(queries::count_records(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unwanted_text_filter_matches_case_insensitively() {
        let pool = fixture_pool().await;
        queries::insert_record(
            &pool,
            100001,
            &json!({"terms": [{"events": [{"event_text":
                "full ORIGINAL event description EXACTLY as written"}]}]}),
        )
        .await
        .unwrap();

        let opts = RemoveDataOptions {
            filter_unwanted_text: true,
            delete: true,
            ..Default::default()
        };
        let report = run(&pool, &opts).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(queries::count_records(&pool).await.unwrap(), 2);
    }
}
