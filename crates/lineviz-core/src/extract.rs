//! Contract between the graph pipeline and a lineage extraction engine
//!
//! An engine looks at exactly one SQL statement and reports which tables it
//! reads, which it writes, which ephemeral relations it defines, and the
//! column-level lineage paths it traces.

use crate::lineage::LineagePath;
use std::collections::BTreeSet;

/// Facts reported by an engine for one statement.
///
/// Lineage paths may be produced lazily; the consumer must drain
/// `paths` before the extraction is dropped.
pub struct Extraction<'a> {
    /// Tables read by the statement
    pub sources: BTreeSet<String>,

    /// Tables written by the statement
    pub targets: BTreeSet<String>,

    /// Ephemeral or derived relations (CTEs, read-and-written tables)
    pub intermediates: BTreeSet<String>,

    /// Column-level lineage paths
    pub paths: Box<dyn Iterator<Item = LineagePath> + 'a>,
}

impl<'a> Extraction<'a> {
    /// Drain the path sequence, producing an owned fact bundle
    pub fn into_facts(self) -> StatementFacts {
        StatementFacts {
            sources: self.sources,
            targets: self.targets,
            intermediates: self.intermediates,
            paths: self.paths.collect(),
        }
    }
}

impl std::fmt::Debug for Extraction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extraction")
            .field("sources", &self.sources)
            .field("targets", &self.targets)
            .field("intermediates", &self.intermediates)
            .finish_non_exhaustive()
    }
}

/// Fully materialized facts for one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementFacts {
    pub sources: BTreeSet<String>,
    pub targets: BTreeSet<String>,
    pub intermediates: BTreeSet<String>,
    pub paths: Vec<LineagePath>,
}

impl StatementFacts {
    /// True when the statement contributed nothing
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
            && self.targets.is_empty()
            && self.intermediates.is_empty()
            && self.paths.is_empty()
    }
}

/// A lineage extraction engine.
///
/// Implementations must be usable for a single request at a time; the graph
/// pipeline never shares one across requests.
pub trait LineageExtractor {
    /// Extract lineage facts from one statement
    fn extract<'a>(&'a self, statement: &'a str) -> Result<Extraction<'a>, ExtractError>;
}

impl<T: LineageExtractor + ?Sized> LineageExtractor for &T {
    fn extract<'a>(&'a self, statement: &'a str) -> Result<Extraction<'a>, ExtractError> {
        (**self).extract(statement)
    }
}

/// Extraction failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Parse error: {0}")]
    Parse(String),
}
