//! Role resolution
//!
//! Merges per-statement facts into one global view: which tables are pure
//! sources, pure targets or intermediates, which fields each table exposes,
//! and the raw column edges between them.

use std::collections::{BTreeMap, BTreeSet};
use lineviz_core::{RawEdge, StatementFacts};

/// Global role of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    Source,
    Target,
    Intermediate,
}

/// Disjoint source / target / intermediate table sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRoleSet {
    pub sources: BTreeSet<String>,
    pub targets: BTreeSet<String>,
    pub intermediates: BTreeSet<String>,
}

impl TableRoleSet {
    /// Role of a table, if it has one
    pub fn role_of(&self, table: &str) -> Option<TableRole> {
        if self.sources.contains(table) {
            Some(TableRole::Source)
        } else if self.targets.contains(table) {
            Some(TableRole::Target)
        } else if self.intermediates.contains(table) {
            Some(TableRole::Intermediate)
        } else {
            None
        }
    }

    pub fn is_source(&self, table: &str) -> bool {
        self.sources.contains(table)
    }

    pub fn is_target(&self, table: &str) -> bool {
        self.targets.contains(table)
    }

    /// Total number of tables with a role
    pub fn len(&self) -> usize {
        self.sources.len() + self.targets.len() + self.intermediates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Table name -> every field name observed for it
pub type FieldIndex = BTreeMap<String, BTreeSet<String>>;

/// Output of role resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFacts {
    pub roles: TableRoleSet,
    pub fields: FieldIndex,
    pub raw_edges: Vec<RawEdge>,
}

/// Merge statement facts into global roles, a field index and raw edges.
///
/// A table read by one statement and written by another is a staging table
/// and becomes an intermediate. Engine-reported intermediates are kept only
/// when they are not a pure source or target. Tables that appear in lineage
/// paths but were never reported at all are treated as intermediates.
pub fn resolve_roles(facts: &[StatementFacts]) -> ResolvedFacts {
    let mut sources: BTreeSet<String> = BTreeSet::new();
    let mut targets: BTreeSet<String> = BTreeSet::new();
    let mut reported: BTreeSet<String> = BTreeSet::new();

    for bundle in facts {
        sources.extend(bundle.sources.iter().cloned());
        targets.extend(bundle.targets.iter().cloned());
        reported.extend(bundle.intermediates.iter().cloned());
    }

    let staging: BTreeSet<String> = sources.intersection(&targets).cloned().collect();
    for table in &staging {
        sources.remove(table);
        targets.remove(table);
    }
    if !staging.is_empty() {
        tracing::debug!(tables = ?staging, "source/target conflicts moved to intermediates");
    }

    let mut intermediates: BTreeSet<String> = reported
        .into_iter()
        .filter(|t| !sources.contains(t) && !targets.contains(t))
        .collect();
    intermediates.extend(staging);

    let mut fields = FieldIndex::new();
    let mut raw_edges = Vec::new();

    for path in facts.iter().flat_map(|bundle| &bundle.paths) {
        for hop in path.hops() {
            fields
                .entry(hop.table.clone())
                .or_default()
                .insert(hop.field.clone());
        }
        raw_edges.extend(path.edges());
    }

    for table in fields.keys() {
        if !sources.contains(table) && !targets.contains(table) && !intermediates.contains(table) {
            tracing::debug!(table = %table, "table without a reported role treated as intermediate");
            intermediates.insert(table.clone());
        }
    }

    ResolvedFacts {
        roles: TableRoleSet {
            sources,
            targets,
            intermediates,
        },
        fields,
        raw_edges,
    }
}
