//! Command handlers for the Tableside CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod reindex;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use reindex::ReindexCommand;
pub use serve::ServeCommand;
