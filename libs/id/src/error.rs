//! Error types for customer identifier parsing.

use thiserror::Error;

/// Errors that can occur when parsing a customer identifier.
///
/// Each variant names the segment that failed so callers can report a
/// precise reason back to whoever typed the identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("customer ID cannot be empty")]
    Empty,

    /// The identifier is missing the hyphen between prefix and body.
    #[error("customer ID missing '-' separator")]
    MissingSeparator,

    /// The prefix is not 1-3 uppercase letters.
    #[error("invalid customer ID prefix '{actual}': expected 1-3 letters A-Z")]
    InvalidPrefix { actual: String },

    /// The block is not exactly three digits.
    #[error("invalid customer ID block '{actual}': expected 3 digits")]
    InvalidBlock { actual: String },

    /// The letter is not a single lowercase letter.
    #[error("invalid customer ID letter '{actual}': expected one letter a-z")]
    InvalidLetter { actual: String },

    /// The counter is not exactly two digits.
    #[error("invalid customer ID counter '{actual}': expected 2 digits")]
    InvalidCounter { actual: String },
}

impl IdError {
    /// Short machine-readable code naming the failing segment.
    pub fn code(&self) -> &'static str {
        match self {
            IdError::Empty => "empty",
            IdError::MissingSeparator => "missing_separator",
            IdError::InvalidPrefix { .. } => "invalid_prefix",
            IdError::InvalidBlock { .. } => "invalid_block",
            IdError::InvalidLetter { .. } => "invalid_letter",
            IdError::InvalidCounter { .. } => "invalid_counter",
        }
    }
}
