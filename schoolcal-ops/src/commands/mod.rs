//! Batch maintenance commands
//!
//! Destructive commands default to dry-run; persistence requires the
//! explicit opt-in flag. Every command reports aggregate counts plus an
//! itemized list of failures with their specific reason.

pub mod export_csv;
pub mod import;
pub mod invalid_json;
pub mod process_status;
pub mod refine_sweep;
pub mod remove_data;
pub mod reset_flags;
pub mod search;
pub mod stats;

/// Itemized lists are capped at this many entries on the console.
pub(crate) const LIST_LIMIT: usize = 20;

pub(crate) fn banner(title: &str) {
    println!("{}", "=".repeat(80));
    println!("{title}");
    println!("{}", "=".repeat(80));
}

/// Print up to [`LIST_LIMIT`] rendered items, then an overflow line.
pub(crate) fn print_limited<T>(items: &[T], render: impl Fn(usize, &T) -> String) {
    for (idx, item) in items.iter().take(LIST_LIMIT).enumerate() {
        println!("{}", render(idx + 1, item));
    }
    if items.len() > LIST_LIMIT {
        println!("  ... and {} more", items.len() - LIST_LIMIT);
    }
}

/// Truncate a payload rendering for console display.
pub(crate) fn preview(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
