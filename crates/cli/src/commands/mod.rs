//! Command handlers for the Yaseen CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod config;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use config::ConfigCommand;
pub use stats::StatsCommand;
