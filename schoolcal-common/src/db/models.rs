//! Database models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A UK school, keyed by its URN (Unique Reference Number).
///
/// The three workflow flags track progress through the sequential scraping
/// stages: `process` (calendar extraction requested), `second_scraper`
/// (re-scrape of missing/invalid data requested), `third_scraper` (final
/// cleanup stage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub urn: i64,
    pub establishment_name: String,
    pub local_authority: String,
    pub establishment_status: String,
    pub website: Option<String>,
    pub process: bool,
    pub second_scraper: bool,
    pub third_scraper: bool,
}

/// One JSON payload snapshot tied to a school.
///
/// `data` is unconstrained: raw CSV import rows, free-text scraper output
/// and refined calendar documents all live in the same column. `None`
/// models a NULL payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolData {
    pub id: i64,
    pub school_urn: i64,
    pub data: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}
