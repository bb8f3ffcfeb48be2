//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that talks to the database:
//! - ArangoDB REST API client
//! - Migration history collection

pub mod arango;
pub mod history;

// Re-export commonly used types
pub use arango::Database;
pub use history::HistoryStore;
