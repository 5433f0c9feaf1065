//! Query helpers shared by the API service and the batch commands.
//!
//! "Current record" resolution lives here and nowhere else: every consumer
//! that needs a school's latest payload goes through [`current_record`] so
//! the ordering rule (newest `created_at`, ties broken by highest id) is
//! applied consistently.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{SqliteExecutor, SqlitePool};

use super::models::{School, SchoolData};
use crate::{Error, Result};

type SchoolRow = (i64, String, String, String, Option<String>, i64, i64, i64);
type RecordRow = (i64, i64, Option<String>, String, String);

const SCHOOL_COLUMNS: &str = "urn, establishment_name, local_authority, establishment_status, \
     website, process, second_scraper, third_scraper";

fn school_from_row(row: SchoolRow) -> School {
    School {
        urn: row.0,
        establishment_name: row.1,
        local_authority: row.2,
        establishment_status: row.3,
        website: row.4,
        process: row.5 != 0,
        second_scraper: row.6 != 0,
        third_scraper: row.7 != 0,
    }
}

fn record_from_row(row: RecordRow) -> Result<SchoolData> {
    let data = match row.2 {
        Some(text) => Some(serde_json::from_str(&text).map_err(Error::Json)?),
        None => None,
    };
    Ok(SchoolData {
        id: row.0,
        school_urn: row.1,
        data,
        created_at: row.3,
        updated_at: row.4,
    })
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// Schools
// ---------------------------------------------------------------------------

pub async fn get_school(pool: &SqlitePool, urn: i64) -> Result<Option<School>> {
    let row: Option<SchoolRow> = sqlx::query_as(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM schools WHERE urn = ?"
    ))
    .bind(urn)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(school_from_row))
}

/// All schools, ordered by establishment name (the display order everywhere)
pub async fn all_schools(pool: &SqlitePool) -> Result<Vec<School>> {
    let rows: Vec<SchoolRow> = sqlx::query_as(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM schools ORDER BY establishment_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(school_from_row).collect())
}

pub async fn school_exists(pool: &SqlitePool, urn: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools WHERE urn = ?")
        .bind(urn)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_school<'e, E: SqliteExecutor<'e>>(
    executor: E,
    urn: i64,
    establishment_name: &str,
    local_authority: &str,
    establishment_status: &str,
    website: Option<&str>,
    process: bool,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO schools (urn, establishment_name, local_authority, establishment_status, \
         website, process) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(urn)
    .bind(establishment_name)
    .bind(local_authority)
    .bind(establishment_status)
    .bind(website)
    .bind(process)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_process<'e, E: SqliteExecutor<'e>>(
    executor: E,
    urn: i64,
    value: bool,
) -> Result<()> {
    sqlx::query("UPDATE schools SET process = ? WHERE urn = ?")
        .bind(value)
        .bind(urn)
        .execute(executor)
        .await?;
    Ok(())
}

/// Reset the downstream-stage flags for a school that must restart the
/// scraping workflow from scratch.
pub async fn reset_downstream_flags<'e, E: SqliteExecutor<'e>>(
    executor: E,
    urn: i64,
) -> Result<()> {
    sqlx::query("UPDATE schools SET second_scraper = 0, third_scraper = 0 WHERE urn = ?")
        .bind(urn)
        .execute(executor)
        .await?;
    Ok(())
}

/// Atomically pick a random unprocessed school and mark it claimed.
///
/// The select-and-flip is a single conditional UPDATE so two concurrent
/// callers can never claim the same school. Returns `(urn, website)`.
pub async fn claim_random_unprocessed(pool: &SqlitePool) -> Result<Option<(i64, Option<String>)>> {
    let row = sqlx::query_as(
        "UPDATE schools SET process = 1 \
         WHERE urn = (SELECT urn FROM schools WHERE process = 0 ORDER BY RANDOM() LIMIT 1) \
         RETURNING urn, website",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// A random school regardless of process state, for the fallback when every
/// school has already been claimed once.
pub async fn random_school(pool: &SqlitePool) -> Result<Option<(i64, Option<String>)>> {
    let row = sqlx::query_as("SELECT urn, website FROM schools ORDER BY RANDOM() LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Schools eligible for the second scraping stage: first stage done, second
/// not yet claimed, and a website to scrape. Random order so concurrent
/// callers spread over different candidates.
pub async fn rescrape_candidates(pool: &SqlitePool) -> Result<Vec<School>> {
    let rows: Vec<SchoolRow> = sqlx::query_as(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM schools \
         WHERE process = 1 AND second_scraper = 0 \
           AND website IS NOT NULL AND website != '' \
         ORDER BY RANDOM()"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(school_from_row).collect())
}

/// Conditionally claim a school for the second scraping stage.
///
/// Returns false when a concurrent caller claimed it first.
pub async fn claim_second_scraper(pool: &SqlitePool, urn: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE schools SET second_scraper = 1 WHERE urn = ? AND second_scraper = 0")
        .bind(urn)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Schools with zero data records, in display order.
pub async fn schools_without_records(pool: &SqlitePool) -> Result<Vec<School>> {
    let rows: Vec<SchoolRow> = sqlx::query_as(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM schools s \
         WHERE NOT EXISTS (SELECT 1 FROM school_data d WHERE d.school_urn = s.urn) \
         ORDER BY establishment_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(school_from_row).collect())
}

// ---------------------------------------------------------------------------
// Data records
// ---------------------------------------------------------------------------

/// The current record for a school: the most recently created one.
pub async fn current_record(pool: &SqlitePool, urn: i64) -> Result<Option<SchoolData>> {
    let row: Option<RecordRow> = sqlx::query_as(
        "SELECT id, school_urn, data, created_at, updated_at FROM school_data \
         WHERE school_urn = ? ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(urn)
    .fetch_optional(pool)
    .await?;
    row.map(record_from_row).transpose()
}

/// All records for a school, newest first.
pub async fn records_for_school(pool: &SqlitePool, urn: i64) -> Result<Vec<SchoolData>> {
    let rows: Vec<RecordRow> = sqlx::query_as(
        "SELECT id, school_urn, data, created_at, updated_at FROM school_data \
         WHERE school_urn = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(urn)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(record_from_row).collect()
}

/// A record joined with the identity of its school, for batch reports.
#[derive(Debug, Clone)]
pub struct RecordWithSchool {
    pub record: SchoolData,
    pub school_name: String,
    pub local_authority: String,
}

/// Every data record with its school's identity, for the batch sweeps.
pub async fn all_records_with_schools(pool: &SqlitePool) -> Result<Vec<RecordWithSchool>> {
    let rows: Vec<(i64, i64, Option<String>, String, String, String, String)> = sqlx::query_as(
        "SELECT d.id, d.school_urn, d.data, d.created_at, d.updated_at, \
                s.establishment_name, s.local_authority \
         FROM school_data d JOIN schools s ON s.urn = d.school_urn \
         ORDER BY d.id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(id, school_urn, data, created_at, updated_at, school_name, local_authority)| {
                Ok(RecordWithSchool {
                    record: record_from_row((id, school_urn, data, created_at, updated_at))?,
                    school_name,
                    local_authority,
                })
            },
        )
        .collect()
}

pub async fn insert_record<'e, E: SqliteExecutor<'e>>(
    executor: E,
    urn: i64,
    data: &Value,
) -> Result<i64> {
    let timestamp = now();
    let result = sqlx::query(
        "INSERT INTO school_data (school_urn, data, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(urn)
    .bind(serde_json::to_string(data)?)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Overwrite a record's payload and bump its update timestamp.
pub async fn update_record_payload<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
    data: &Value,
) -> Result<()> {
    sqlx::query("UPDATE school_data SET data = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(data)?)
        .bind(now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete_record<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM school_data WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn count_records(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM school_data")
        .fetch_one(pool)
        .await?)
}

/// True/false totals for the three workflow flags, for the stats report.
#[derive(Debug, Clone, Copy)]
pub struct FlagCounts {
    pub total: i64,
    pub process: i64,
    pub second_scraper: i64,
    pub third_scraper: i64,
}

pub async fn flag_counts(pool: &SqlitePool) -> Result<FlagCounts> {
    let row: (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COALESCE(SUM(process), 0), \
                COALESCE(SUM(second_scraper), 0), \
                COALESCE(SUM(third_scraper), 0) \
         FROM schools",
    )
    .fetch_one(pool)
    .await?;
    Ok(FlagCounts {
        total: row.0,
        process: row.1,
        second_scraper: row.2,
        third_scraper: row.3,
    })
}
