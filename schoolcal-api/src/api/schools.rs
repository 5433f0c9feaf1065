//! Full dump of schools joined with their current record

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use schoolcal_common::db::queries;

use super::ApiError;
use crate::AppState;

/// One school with its current record payload, for display
#[derive(Debug, Serialize)]
pub struct SchoolWithData {
    pub urn: i64,
    pub establishment_name: String,
    pub local_authority: String,
    pub establishment_status: String,
    pub website: Option<String>,
    pub process: bool,
    pub second_scraper: bool,
    pub third_scraper: bool,
    pub data: Option<Value>,
    pub data_created_at: Option<String>,
    pub data_updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SchoolsResponse {
    pub total_schools: usize,
    pub schools: Vec<SchoolWithData>,
}

/// GET /api/schools
///
/// Every school in display order, each joined with its current record.
pub async fn list_schools(
    State(state): State<AppState>,
) -> Result<Json<SchoolsResponse>, ApiError> {
    let schools = queries::all_schools(&state.db).await?;

    let mut out = Vec::with_capacity(schools.len());
    for school in schools {
        let record = queries::current_record(&state.db, school.urn).await?;
        let (data, created_at, updated_at) = match record {
            Some(record) => (record.data, Some(record.created_at), Some(record.updated_at)),
            None => (None, None, None),
        };
        out.push(SchoolWithData {
            urn: school.urn,
            establishment_name: school.establishment_name,
            local_authority: school.local_authority,
            establishment_status: school.establishment_status,
            website: school.website,
            process: school.process,
            second_scraper: school.second_scraper,
            third_scraper: school.third_scraper,
            data,
            data_created_at: created_at,
            data_updated_at: updated_at,
        });
    }

    Ok(Json(SchoolsResponse {
        total_schools: out.len(),
        schools: out,
    }))
}
