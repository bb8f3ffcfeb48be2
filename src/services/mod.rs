//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure:
//! loading scripts from disk, scaffolding new ones, and driving the
//! plan/execute cycle against a connected database.

pub mod loader;
pub mod runner;
pub mod scaffold;

// Re-export commonly used types
pub use loader::{MigrationSet, ScriptCache};
pub use runner::{RunSummary, Runner};
