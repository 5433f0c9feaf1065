//! Re-scrape candidate selection
//!
//! Hands out one school whose first scrape produced nothing usable, so the
//! second-stage scraper can retry it.

use axum::{extract::State, Json};
use serde::Serialize;

use schoolcal_common::calendar::{classify, DataStatus};
use schoolcal_common::db::queries;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct InvalidDataResponse {
    pub school_id: String,
    pub school_name: String,
    pub website: String,
    pub reason: String,
}

/// GET /api/schools/invalid-data
///
/// Among schools with `process` set, `second_scraper` unset and a website,
/// picks one (random order) whose current record is missing or not
/// calendar-shaped, claims it by flipping `second_scraper`, and returns it.
/// The claim is conditional: if a concurrent caller won the same school,
/// the scan moves on to the next candidate. 404 when no school qualifies.
pub async fn claim_invalid_data(
    State(state): State<AppState>,
) -> Result<Json<InvalidDataResponse>, ApiError> {
    let candidates = queries::rescrape_candidates(&state.db).await?;

    for school in candidates {
        let reason = match queries::current_record(&state.db, school.urn).await? {
            None => "no_data",
            Some(record) => match classify(record.data.as_ref()) {
                // Calendar-shaped payloads (even with empty terms) are not
                // re-scrape candidates
                DataStatus::Refined | DataStatus::RefinedEmptyTerms => continue,
                _ => "invalid_data",
            },
        };

        if queries::claim_second_scraper(&state.db, school.urn).await? {
            return Ok(Json(InvalidDataResponse {
                school_id: school.urn.to_string(),
                school_name: school.establishment_name,
                website: school.website.unwrap_or_default(),
                reason: reason.to_string(),
            }));
        }
        // Lost the claim to a concurrent caller; try the next candidate
    }

    Err(ApiError::NotFound(
        "No schools with missing or invalid data found".to_string(),
    ))
}
