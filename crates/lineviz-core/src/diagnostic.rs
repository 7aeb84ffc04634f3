//! Diagnostic codes and failure reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A statement could not be parsed by the extraction engine
    SqlParseError,

    /// The configuration file is missing or malformed
    ConfigError,

    /// A lineage request body is malformed
    InvalidRequest,

    /// Reading input or writing output failed
    IoError,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlParseError => "SQL_PARSE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure envelope returned instead of a graph.
///
/// Serializes as `{"error": ..., "code": ..., "statement": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message
    #[serde(rename = "error")]
    pub message: String,

    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// 1-based index of the offending statement, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statement: Option<usize>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            statement: None,
        }
    }

    /// Attach the offending statement index
    pub fn with_statement(mut self, statement: usize) -> Self {
        self.statement = Some(statement);
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.statement {
            Some(idx) => write!(f, "[{}] statement {}: {}", self.code, idx, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
