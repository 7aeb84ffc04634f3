//! Lineage request envelope
//!
//! Mirrors the JSON body accepted by the lineage service:
//! `{"sql_query": "...", "include_intermediate_tables": true, "filter_ctes": true}`.

use serde::{Deserialize, Serialize};
use crate::config::DisplayPolicy;
use crate::diagnostic::{Diagnostic, DiagnosticCode};

/// A request for one lineage graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRequest {
    /// SQL script, possibly holding several statements
    pub sql_query: String,

    /// Render intermediate tables
    #[serde(default = "default_true")]
    pub include_intermediate_tables: bool,

    /// Only render physical intermediates
    #[serde(default = "default_true", alias = "filter_ctes")]
    pub filter_physical_only: bool,

    /// Produce table-level lineage instead of column-level
    #[serde(default)]
    pub table_level: bool,
}

fn default_true() -> bool {
    true
}

impl LineageRequest {
    /// Create a column-level request with the default policy
    pub fn new(sql_query: impl Into<String>) -> Self {
        Self {
            sql_query: sql_query.into(),
            include_intermediate_tables: true,
            filter_physical_only: true,
            table_level: false,
        }
    }

    /// Parse a request body
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        if body.trim().is_empty() {
            return Err(RequestError::EmptyBody);
        }
        serde_json::from_str(body).map_err(|e| RequestError::InvalidJson(e.to_string()))
    }

    /// Display policy carried by this request
    pub fn policy(&self) -> DisplayPolicy {
        DisplayPolicy {
            include_intermediate_tables: self.include_intermediate_tables,
            filter_physical_only: self.filter_physical_only,
        }
    }
}

/// Request decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Empty request body")]
    EmptyBody,

    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

impl RequestError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::InvalidRequest, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let request = LineageRequest::from_json(r#"{"sql_query": "SELECT 1"}"#).unwrap();
        assert_eq!(request, LineageRequest::new("SELECT 1"));
        assert_eq!(request.policy(), DisplayPolicy::default());
    }

    #[test]
    fn empty_body_diagnostic() {
        let err = LineageRequest::from_json("  ").unwrap_err();
        assert_eq!(err, RequestError::EmptyBody);
        assert_eq!(err.to_diagnostic().code, DiagnosticCode::InvalidRequest);
    }

    #[test]
    fn legacy_filter_ctes_name() {
        let request = LineageRequest::from_json(
            r#"{"sql_query": "x", "include_intermediate_tables": false, "filter_ctes": false}"#,
        )
        .unwrap();
        assert!(!request.include_intermediate_tables);
        assert!(!request.filter_physical_only);
    }

    #[test]
    fn missing_query_rejected() {
        assert!(matches!(
            LineageRequest::from_json(r#"{"filter_ctes": true}"#),
            Err(RequestError::InvalidJson(_))
        ));
        assert_eq!(LineageRequest::from_json("  "), Err(RequestError::EmptyBody));
    }
}
