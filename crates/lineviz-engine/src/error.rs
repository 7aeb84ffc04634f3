//! Pipeline errors

use lineviz_core::{Diagnostic, DiagnosticCode, ExtractError};

/// Errors that abort a lineage request
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    /// The extraction engine rejected a statement. No partial graph is
    /// produced; the caller must resubmit a corrected script.
    #[error("Statement {statement}: {source}")]
    Extraction {
        /// 1-based statement index
        statement: usize,
        #[source]
        source: ExtractError,
    },
}

impl LineageError {
    /// Convert to a machine-readable failure envelope
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Extraction { statement, source } => {
                let message = match source {
                    ExtractError::Parse(message) => message.clone(),
                };
                Diagnostic::new(DiagnosticCode::SqlParseError, message).with_statement(*statement)
            }
        }
    }
}
