//! schoolcal-ops library - batch maintenance commands
//!
//! Each command is a pure-ish `run` returning a report struct; printing is
//! separate so the sweeps stay testable against an in-memory database.

pub mod commands;
