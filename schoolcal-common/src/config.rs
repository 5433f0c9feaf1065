//! Configuration loading and database path resolution

use std::path::PathBuf;

/// Database path resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SCHOOLCAL_DB` environment variable
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&PathBuf>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.clone();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("SCHOOLCAL_DB") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: OS-dependent compiled default
    default_database_path()
}

/// Get OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("schoolcal").join("schoolcal.db"))
        .unwrap_or_else(|| PathBuf::from("./schoolcal.db"))
}
