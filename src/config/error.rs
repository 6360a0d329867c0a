//! Configuration error types for loading and parsing TOML config files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path that was requested but does not exist.
        path: PathBuf,
    },

    /// The TOML content could not be parsed.
    #[error("invalid configuration at {path}:{line}:{column}: {message}")]
    Parse {
        /// Path to the file containing the error.
        path: PathBuf,
        /// One-based line index of the error (0 if unknown).
        line: usize,
        /// One-based column index of the error (0 if unknown).
        column: usize,
        /// Human-readable description of the parse failure.
        message: String,
    },

    /// A duration field holds a string `humantime` cannot parse.
    #[error("invalid duration {value:?} for {field}: {message}")]
    InvalidDuration {
        /// Configuration field holding the bad value.
        field: &'static str,
        /// The unparseable value.
        value: String,
        /// Parser error detail.
        message: String,
    },
}
