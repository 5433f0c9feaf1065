//! The calendar refinement sweep
//!
//! Runs every data record through the refine pipeline. Dry-run by default;
//! `--save` persists the normalized documents in one transaction, so a
//! mid-batch infrastructure failure leaves no record half-updated relative
//! to the others. Per-record refinement failures are rejections, never
//! aborts.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;
use sqlx::SqlitePool;

use schoolcal_common::calendar::refine;
use schoolcal_common::db::queries;

use super::{banner, print_limited};

#[derive(Debug, Clone, Default)]
pub struct RefineOptions {
    /// Persist refined payloads (dry-run otherwise)
    pub save: bool,
    /// Delete unrecoverable records (only honored with save)
    pub delete_invalid: bool,
    /// Write the refined documents to a JSON file
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RefinedEntry {
    pub id: i64,
    pub urn: i64,
    pub school_name: String,
    pub doc: Value,
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub id: i64,
    pub urn: i64,
    pub school_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RefineReport {
    pub total: usize,
    pub refined: Vec<RefinedEntry>,
    pub rejected: Vec<Rejection>,
    pub saved: usize,
    pub deleted: usize,
}

pub async fn run(pool: &SqlitePool, opts: &RefineOptions) -> Result<RefineReport> {
    let entries = queries::all_records_with_schools(pool).await?;

    let mut report = RefineReport {
        total: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        match refine(entry.record.data.as_ref()) {
            Ok(doc) => report.refined.push(RefinedEntry {
                id: entry.record.id,
                urn: entry.record.school_urn,
                school_name: entry.school_name.clone(),
                doc,
            }),
            Err(reason) => report.rejected.push(Rejection {
                id: entry.record.id,
                urn: entry.record.school_urn,
                school_name: entry.school_name.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    if opts.save {
        let mut tx = pool.begin().await?;
        for entry in &report.refined {
            queries::update_record_payload(&mut *tx, entry.id, &entry.doc).await?;
            report.saved += 1;
        }
        if opts.delete_invalid {
            for rejection in &report.rejected {
                queries::delete_record(&mut *tx, rejection.id).await?;
                report.deleted += 1;
            }
        }
        tx.commit().await?;
    }

    if let Some(path) = &opts.out {
        let docs: Vec<&Value> = report.refined.iter().map(|entry| &entry.doc).collect();
        std::fs::write(path, serde_json::to_string_pretty(&docs)?)?;
    }

    Ok(report)
}

impl RefineReport {
    pub fn print(&self, opts: &RefineOptions) {
        banner("REFINING ACADEMIC CALENDAR DATA");
        println!(
            "Mode: {}",
            if opts.save { "SAVE" } else { "DRY RUN (preview only)" }
        );
        println!("Total data records: {}", self.total);
        println!("Records with valid calendar data: {}", self.refined.len());
        println!("Invalid records: {}", self.rejected.len());
        if opts.save {
            println!("Saved: {} records", self.saved);
            if opts.delete_invalid {
                println!("Deleted: {} records", self.deleted);
            }
        }

        if !self.refined.is_empty() {
            println!("\nREFINED RECORDS");
            print_limited(&self.refined, |idx, entry| {
                let terms = entry.doc["terms"].as_array().map(Vec::len).unwrap_or(0);
                format!(
                    "[{idx}] record {} URN {} {}: {} terms",
                    entry.id, entry.urn, entry.school_name, terms
                )
            });
        }

        if !self.rejected.is_empty() {
            println!("\nINVALID RECORDS");
            print_limited(&self.rejected, |idx, rejection| {
                format!(
                    "[{idx}] record {} URN {} {}: {}",
                    rejection.id, rejection.urn, rejection.school_name, rejection.reason
                )
            });
        }

        if !opts.save {
            println!("\nThis was a dry run; re-run with --save to persist refined data.");
        }
        if let Some(path) = &opts.out {
            println!("Refined documents written to: {}", path.display());
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
        queries::insert_school(&pool, 100002, "Beta Academy", "Islington", "Open", None, true)
            .await
            .unwrap();
        pool
    }

    fn wrapped_calendar() -> Value {
        json!({"text": "```json\n{\"school_name\":\"Alpha Primary\",\"source_url\":\"u\",\
            \"terms\":[{\"academic_year\":\"2024-2025\",\"term_name\":\"Autumn\",\
            \"events\":[{\"start_date\":\"2024-09-02\",\"event_text\":\"Start\"}]}]}\n```"})
    }

    #[tokio::test]
    async fn dry_run_classifies_without_persisting() {
        let pool = fixture_pool().await;
        queries::insert_record(&pool, 100001, &wrapped_calendar()).await.unwrap();
        queries::insert_record(&pool, 100002, &json!({"noise": true})).await.unwrap();

        let report = run(&pool, &RefineOptions::default()).await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.refined.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, "Could not extract JSON");
        assert_eq!(report.saved, 0);

        // Payload untouched
        let current = queries::current_record(&pool, 100001).await.unwrap().unwrap();
        assert!(current.data.unwrap().get("text").is_some());
    }

    #[tokio::test]
    async fn save_persists_normalized_documents() {
        let pool = fixture_pool().await;
        queries::insert_record(&pool, 100001, &wrapped_calendar()).await.unwrap();

        let opts = RefineOptions {
            save: true,
            ..Default::default()
        };
        let report = run(&pool, &opts).await.unwrap();
        assert_eq!(report.saved, 1);

        let current = queries::current_record(&pool, 100001).await.unwrap().unwrap();
        let doc = current.data.unwrap();
        assert_eq!(doc["school_name"], "Alpha Primary");
        assert_eq!(doc["terms"][0]["events"][0]["end_date"], Value::Null);
    }

    #[tokio::test]
    async fn delete_invalid_removes_unrecoverable_records() {
        let pool = fixture_pool().await;
        queries::insert_record(&pool, 100001, &wrapped_calendar()).await.unwrap();
        queries::insert_record(&pool, 100002, &json!({"noise": true})).await.unwrap();

        let opts = RefineOptions {
            save: true,
            delete_invalid: true,
            out: None,
        };
        let report = run(&pool, &opts).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(queries::count_records(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejection_reasons_name_the_specific_failure() {
        let pool = fixture_pool().await;
        queries::insert_record(&pool, 100001, &json!({"school_name": "A", "terms": []}))
            .await
            .unwrap();

        let report = run(&pool, &RefineOptions::default()).await.unwrap();
        assert_eq!(
            report.rejected[0].reason,
            "Invalid format: Missing required field: source_url"
        );
    }
}
