//! Error types for grammar file operations.
//!
//! Covers reading and decoding grammar files as well as the structural errors
//! raised while turning a grammar description into a parser tree.

use argtree_core::GrammarError;
use thiserror::Error;

/// Errors that can occur while loading or building a grammar.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File extension is not one of `json`, `yaml`, `yml`.
    #[error("unsupported grammar format: {0}")]
    UnsupportedFormat(String),

    /// Converter settings that can never accept a value.
    #[error("invalid converter for argument '{argument}': {reason}")]
    InvalidConverter { argument: String, reason: String },

    /// The grammar tree could not be built (duplicate keys, empty names...).
    #[error("invalid grammar: {0}")]
    Grammar(#[from] GrammarError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
