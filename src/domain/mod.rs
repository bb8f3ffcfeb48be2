//! Domain layer - migration entities and planning logic
//!
//! Keys, scripts, and plans are pure and unit tested without mocking; the
//! Migration entity delegates step execution to the database adapter.

pub mod key;
pub mod migration;
pub mod plan;
pub mod script;

// Re-export commonly used types
pub use key::SequenceKey;
pub use migration::Migration;
pub use plan::{Direction, MigrationPlan};
pub use script::{MigrationScript, ScriptStep};
