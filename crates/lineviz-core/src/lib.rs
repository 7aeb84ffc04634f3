//! lineviz core
//!
//! Shared domain model: lineage value types, the extraction-engine contract,
//! the render payload, configuration and stable diagnostic codes.

pub mod lineage;
pub mod extract;
pub mod graph;
pub mod script;
pub mod config;
pub mod diagnostic;
pub mod request;

pub use lineage::{ColumnRef, LineagePath, ColumnEdge, RawEdge, RenderEdge, is_qualified, QUALIFIER_SEPARATOR};
pub use extract::{Extraction, LineageExtractor, StatementFacts, ExtractError};
pub use graph::{LineageGraph, GraphNode, GraphEdge, NodeField, NodeRole, EdgeEndpoint};
pub use script::{split_script, split_statements, SplitOptions, DEFAULT_DELIMITER};
pub use config::{Config, ConfigError, DialectConfig, DisplayPolicy, LayoutConfig};
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use request::{LineageRequest, RequestError};
