//! Reconciliation policy for the workflow flags.
//!
//! Pure decision helpers: the batch commands walk the database and apply
//! whatever these return, so the policy itself stays testable without
//! storage.

use super::classify::DataStatus;

/// Decide whether a school's `process` flag needs flipping, given the
/// classification of its current record.
///
/// Promotion (false → true) always applies when the school has usable data.
/// Demotion (true → false) is opt-in via `demote`: workflow progress is
/// one-directional unless the operator explicitly asks for backsliding.
///
/// Returns the new flag value, or `None` when the flag is already correct.
pub fn process_flag_action(status: DataStatus, process: bool, demote: bool) -> Option<bool> {
    match (status.is_usable(), process) {
        (true, false) => Some(true),
        (false, true) if demote => Some(false),
        _ => None,
    }
}

/// A school with zero data records never ran validation and must restart
/// the workflow; its downstream-stage flags are stale if still set. Scoped
/// to schools showing at least one flag true, to avoid no-op writes.
pub fn needs_flag_reset(record_count: i64, second_scraper: bool, third_scraper: bool) -> bool {
    record_count == 0 && (second_scraper || third_scraper)
}
