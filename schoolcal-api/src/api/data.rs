//! Data ingest endpoint
//!
//! The scraping agent posts its output here. A school's current record is
//! updated by shallow merge (incoming keys win); a school without a record
//! gets a new one.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{Map, Value};

use schoolcal_common::db::queries;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub message: String,
    pub school_id: String,
    pub action: String,
    pub data: Value,
}

fn bad_request(msg: &str) -> ApiError {
    ApiError::BadRequest(msg.to_string())
}

/// POST /api/schools/data
///
/// Body: `{"school_id": <urn>, "data": {...}}`. Validation failures are
/// reported in a fixed order: unparsable body, missing school_id, missing
/// data, non-object data; then 404 for an unknown school. The body is taken
/// as a raw string so these reasons stay ours rather than the framework's.
pub async fn upsert_school_data(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<UpsertResponse>), ApiError> {
    let body: Value = serde_json::from_str(&body)
        .map_err(|_| bad_request("Invalid JSON in request body"))?;

    // Explicit null is treated the same as absent
    let school_id = match body.get("school_id") {
        None | Some(Value::Null) => return Err(bad_request("school_id is required")),
        Some(value) => value,
    };
    let school_id = parse_school_id(school_id)
        .ok_or_else(|| bad_request("Invalid school_id format. Must be an integer."))?;

    let data = match body.get("data") {
        None | Some(Value::Null) => return Err(bad_request("data is required")),
        Some(value) => value,
    };
    let data = data
        .as_object()
        .ok_or_else(|| bad_request("data must be a JSON object"))?;

    if !queries::school_exists(&state.db, school_id).await? {
        return Err(ApiError::NotFound(format!(
            "School with ID {school_id} not found"
        )));
    }

    match queries::current_record(&state.db, school_id).await? {
        Some(record) => {
            // Shallow merge onto the existing payload: new keys override
            // same-named existing keys, others are preserved
            let mut merged: Map<String, Value> = record
                .data
                .as_ref()
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            for (key, value) in data {
                merged.insert(key.clone(), value.clone());
            }
            let merged = Value::Object(merged);

            queries::update_record_payload(&state.db, record.id, &merged).await?;

            Ok((
                StatusCode::OK,
                Json(UpsertResponse {
                    message: "SchoolData updated successfully".to_string(),
                    school_id: school_id.to_string(),
                    action: "updated".to_string(),
                    data: merged,
                }),
            ))
        }
        None => {
            let payload = Value::Object(data.clone());
            queries::insert_record(&state.db, school_id, &payload).await?;

            Ok((
                StatusCode::CREATED,
                Json(UpsertResponse {
                    message: "SchoolData created successfully".to_string(),
                    school_id: school_id.to_string(),
                    action: "created".to_string(),
                    data: payload,
                }),
            ))
        }
    }
}

/// Accepts an integer or an integer-valued string.
fn parse_school_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
