//! Yaseen Core Library
//!
//! This crate provides the foundational utilities shared by every Yaseen crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Settings management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::Settings;
pub use error::{AppError, AppResult, ErrorKind};
