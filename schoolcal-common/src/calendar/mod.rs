//! The academic-calendar data pipeline.
//!
//! Raw payloads (CSV import rows, free-text scraper output, already-refined
//! documents) flow extract → refine → validate into one canonical calendar
//! document shape, with [`classify`] providing the reporting taxonomy the
//! dashboards, exports and flag reconcilers all share.

pub mod classify;
pub mod extract;
pub mod refine;
pub mod sweep;
pub mod validate;

pub use classify::{classify, DataStatus};
pub use extract::extract_json;
pub use refine::{refine, RefineError};
pub use sweep::{needs_flag_reset, process_flag_action};
pub use validate::{validate_calendar, SchemaError};
