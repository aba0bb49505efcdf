//! Error types for rangestyle

use std::fmt;

use thiserror::Error;

/// Result type alias for styling operations
pub type Result<T> = std::result::Result<T, StyleError>;

/// A setter the host could not run inline and must service out of band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRequest {
    /// Style or layout field name the request concerns
    pub field: String,
    /// First UTF-16 index of the run
    pub from: usize,
    /// Number of UTF-16 code units in the run
    pub count: usize,
}

impl fmt::Display for HostRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} over {}+{}", self.field, self.from, self.count)
    }
}

/// Styling error types
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("unknown character class: {0}")]
    UnknownClass(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("unknown style field: {0}")]
    UnknownStyleField(String),

    #[error("unknown layout field: {0}")]
    UnknownLayoutField(String),

    #[error("invalid value for {field}: expected {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },

    #[error("open and close delimiters must not be empty")]
    EmptyDelimiter,

    #[error("rule file: {0}")]
    RuleFile(String),

    #[error("host callback required: {0}")]
    HostCallback(HostRequest),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StyleError {
    /// Whether this is a configuration error (bad keys, fields or rules)
    /// as opposed to a host callback or I/O failure.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, StyleError::HostCallback(_) | StyleError::Io(_))
    }
}
