//! Export surfaces: text dumps, saved databases and progress reporting

pub mod database;
pub mod export;
pub mod progress;

pub use database::{list_databases, TypeDatabase, DATABASE_DIR, DATABASE_EXTENSION};
pub use export::format_dump;
pub use progress::ProgressReporter;
