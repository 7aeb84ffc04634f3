//! SQL lineage extraction
//!
//! This crate handles:
//! - Parsing SQL using datafusion-sqlparser-rs
//! - Resolving CTEs, aliases, and table references to column lineage
//! - Reporting per-statement facts through the `LineageExtractor` contract

pub mod parser;
pub mod resolver;
pub mod extractor;

pub use parser::{SqlParser, ParsedSql, ParseError};
pub use resolver::{LineageResolver, Projection, Chains, WILDCARD_COLUMN};
pub use extractor::SqlLineageExtractor;
