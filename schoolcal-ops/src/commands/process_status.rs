//! Process-flag reconciliation
//!
//! Walks every school and compares its `process` flag against the actual
//! state of its current record. Promotion is always applied; demotion is
//! opt-in so workflow progress cannot be rolled back by accident.

use anyhow::Result;
use sqlx::SqlitePool;

use schoolcal_common::calendar::{classify, process_flag_action};
use schoolcal_common::db::queries;

use super::{banner, print_limited};

#[derive(Debug, Clone, Default)]
pub struct ProcessStatusOptions {
    /// Apply the computed flag changes (dry-run otherwise)
    pub update: bool,
    /// Also demote process=true schools without valid data
    pub set_false: bool,
}

#[derive(Debug, Clone)]
pub struct SchoolRef {
    pub urn: i64,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct ProcessStatusReport {
    pub total: usize,
    pub promote: Vec<SchoolRef>,
    pub demote: Vec<SchoolRef>,
    pub already_correct: usize,
    pub updated_true: usize,
    pub updated_false: usize,
}

pub async fn run(pool: &SqlitePool, opts: &ProcessStatusOptions) -> Result<ProcessStatusReport> {
    let schools = queries::all_schools(pool).await?;

    let mut report = ProcessStatusReport {
        total: schools.len(),
        ..Default::default()
    };

    for school in &schools {
        let record = queries::current_record(pool, school.urn).await?;
        let status = classify(record.as_ref().and_then(|r| r.data.as_ref()));

        // Decide with demotion allowed, then gate the demotion on the flag:
        // a mismatched school the operator chose not to demote counts as
        // neither an update nor already-correct, matching the report shape
        // operators expect.
        match process_flag_action(status, school.process, true) {
            Some(true) => report.promote.push(SchoolRef {
                urn: school.urn,
                name: school.establishment_name.clone(),
            }),
            Some(false) if opts.set_false => report.demote.push(SchoolRef {
                urn: school.urn,
                name: school.establishment_name.clone(),
            }),
            Some(false) => {}
            None => report.already_correct += 1,
        }
    }

    if opts.update {
        let mut tx = pool.begin().await?;
        for school in &report.promote {
            queries::set_process(&mut *tx, school.urn, true).await?;
            report.updated_true += 1;
        }
        for school in &report.demote {
            queries::set_process(&mut *tx, school.urn, false).await?;
            report.updated_false += 1;
        }
        tx.commit().await?;
    }

    Ok(report)
}

impl ProcessStatusReport {
    pub fn print(&self, opts: &ProcessStatusOptions) {
        banner("UPDATING PROCESS STATUS");
        println!(
            "Mode: {}",
            if opts.update { "UPDATE" } else { "DRY RUN (preview only)" }
        );
        println!("Total schools: {}", self.total);
        println!("Schools to set process=true: {}", self.promote.len());
        if opts.set_false {
            println!("Schools to set process=false: {}", self.demote.len());
        }
        println!("Schools already correct: {}", self.already_correct);

        if !self.promote.is_empty() {
            println!("\nSCHOOLS TO SET process=true");
            print_limited(&self.promote, |idx, school| {
                format!("[{idx}] URN: {}, Name: {}", school.urn, school.name)
            });
        }
        if opts.set_false && !self.demote.is_empty() {
            println!("\nSCHOOLS TO SET process=false");
            print_limited(&self.demote, |idx, school| {
                format!("[{idx}] URN: {}, Name: {}", school.urn, school.name)
            });
        }

        if opts.update {
            println!("\nSet process=true for {} schools", self.updated_true);
            if opts.set_false {
                println!("Set process=false for {} schools", self.updated_false);
            }
        } else {
            println!("\nThis was a dry run; re-run with --update to apply changes.");
        }
    }
}
