//! Prompt issuance endpoints
//!
//! Hands the academic-calendar extraction prompt to the scraping agent,
//! either for a specific school or for a randomly selected one.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use schoolcal_common::db::queries;
use schoolcal_common::prompt::calendar_prompt;

use super::ApiError;
use crate::AppState;

/// Prompt response: the school to scrape and the prompt to run
#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub school_id: String,
    pub prompt: String,
}

/// GET /api/schools/:school_id/prompt
///
/// Returns the extraction prompt for one school, built from its website.
/// 404 when the school does not exist; a non-integer id is rejected by the
/// path extractor as 400.
pub async fn school_prompt(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
) -> Result<Json<PromptResponse>, ApiError> {
    let school = queries::get_school(&state.db, school_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("School with ID {school_id} not found")))?;

    Ok(Json(PromptResponse {
        school_id: school.urn.to_string(),
        prompt: calendar_prompt(school.website.as_deref()),
    }))
}

/// GET /api/schools/random/prompt
///
/// Selects a school (preferring unprocessed ones), marks it claimed, and
/// returns its prompt. The claim is a single conditional update so two
/// concurrent callers never receive the same unprocessed school. Once every
/// school has been claimed, falls back to re-issuing a random school.
pub async fn random_school_prompt(
    State(state): State<AppState>,
) -> Result<Json<PromptResponse>, ApiError> {
    let (urn, website) = match queries::claim_random_unprocessed(&state.db).await? {
        Some(claimed) => claimed,
        None => {
            let (urn, website) = queries::random_school(&state.db)
                .await?
                .ok_or_else(|| ApiError::NotFound("No schools found in database".to_string()))?;
            queries::set_process(&state.db, urn, true).await?;
            (urn, website)
        }
    };

    Ok(Json(PromptResponse {
        school_id: urn.to_string(),
        prompt: calendar_prompt(website.as_deref()),
    }))
}
