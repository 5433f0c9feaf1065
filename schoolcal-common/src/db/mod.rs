//! Database access layer for schoolcal

mod init;
pub mod models;
pub mod queries;

pub use init::{init_database, init_in_memory};
