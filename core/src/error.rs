//! Error types for grammar construction and parsing.
//!
//! [`GrammarError`] covers mistakes made while registering nodes.
//! [`ParseError`] covers every way a token stream can fail to satisfy the
//! grammar; each one ends the current parse pass.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while building the grammar tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Flag key is empty or whitespace-only.
    #[error("flag key cannot be empty")]
    EmptyKey,
    /// Positional argument name is empty or whitespace-only.
    #[error("argument name cannot be empty")]
    EmptyArgumentName,
    /// Two flags in the same store share a key.
    #[error("duplicate flag in scope: {0}")]
    DuplicateKey(String),
    /// Store handle does not belong to this parser.
    #[error("unknown flag store")]
    UnknownStore,
    /// Group handle does not belong to this parser.
    #[error("unknown exclusive group")]
    UnknownGroup,
    /// Flag handle does not belong to this parser.
    #[error("unknown flag")]
    UnknownFlag,
}

/// Kind of a [`ParseError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    MissingMandatoryFlag,
    MissingMandatoryArgument,
    RepeatedFlag,
    UnexpectedArgument,
    ExclusiveConflict,
    ConversionFailure,
}

/// A parse failure.
///
/// Option listings are captured from the flag store where parsing stopped, in
/// declaration order, with optional entries wrapped in `[ ]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Tokens ran out before every mandatory flag matched.
    #[error("Missing mandatory flag(s). Valid option(s) are: {}", .options.join(", "))]
    MissingMandatoryFlag { options: Vec<String> },

    /// Tokens ran out before every mandatory positional argument matched.
    #[error("Missing mandatory argument(s). Valid option(s) are: {}", .options.join(", "))]
    MissingMandatoryArgument { options: Vec<String> },

    /// A flag key appeared twice in one pass.
    #[error("Repeated flag: {flag}")]
    RepeatedFlag { flag: String },

    /// A token matched nothing that was still needed.
    #[error("Unexpected argument: {token}\nValid option(s): {}", .options.join(", "))]
    UnexpectedArgument { token: String, options: Vec<String> },

    /// Two members of one exclusive group were used.
    #[error(
        "Cannot use {first} in conjunction with {second}.\nThe following flags are exclusive: {}",
        .exclusive.join("|")
    )]
    ExclusiveConflict {
        first: String,
        second: String,
        exclusive: Vec<String>,
    },

    /// A mandatory positional argument rejected its token.
    #[error("Could not parse argument: {argument}\n{message}")]
    ConversionFailure { argument: String, message: String },
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::MissingMandatoryFlag { .. } => ParseErrorKind::MissingMandatoryFlag,
            Self::MissingMandatoryArgument { .. } => ParseErrorKind::MissingMandatoryArgument,
            Self::RepeatedFlag { .. } => ParseErrorKind::RepeatedFlag,
            Self::UnexpectedArgument { .. } => ParseErrorKind::UnexpectedArgument,
            Self::ExclusiveConflict { .. } => ParseErrorKind::ExclusiveConflict,
            Self::ConversionFailure { .. } => ParseErrorKind::ConversionFailure,
        }
    }
}
