//! Configuration system for panemux.
//!
//! This crate provides configuration loading, saving, and default values
//! for the panel client. It includes:
//!
//! - The YAML-backed [`Config`] with reconnect, layout, and logging settings
//! - Shared enum types (`LogLevel`, `KeyboardMode`)
//! - The persisted scalar state store used for layout restore
//!   ([`StateStore`], [`FileStateStore`], [`MemoryStateStore`])

pub mod config;
pub mod defaults;
mod error;
pub mod state_store;
mod types;

// Re-export main types for convenience
pub use config::{Config, DIVIDER_RATIO_MAX, DIVIDER_RATIO_MIN};
pub use error::ConfigError;
pub use state_store::{FileStateStore, MemoryStateStore, StateStore, keys};
pub use types::{KeyboardMode, LogLevel};
