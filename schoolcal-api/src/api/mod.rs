//! HTTP API handlers for schoolcal-api

pub mod data;
pub mod error;
pub mod health;
pub mod invalid;
pub mod prompt;
pub mod schools;

pub use data::upsert_school_data;
pub use error::ApiError;
pub use health::health_routes;
pub use invalid::claim_invalid_data;
pub use prompt::{random_school_prompt, school_prompt};
pub use schools::list_schools;
