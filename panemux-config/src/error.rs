//! Typed error variants for the panemux-config crate.
//!
//! `Config::load` and `Config::save` still return `anyhow::Result`; callers
//! that want to match on a specific failure can downcast to [`ConfigError`].

use thiserror::Error;

/// Errors that can occur when loading, validating, or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing a config or state file.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The file contained invalid YAML that could not be parsed.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string names the field and why it was rejected.
    #[error("Config validation error: {0}")]
    Validation(String),
}
