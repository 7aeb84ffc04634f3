//! Table-level lineage
//!
//! A coarser rendering: one edge per (source, target) pair of a statement,
//! no fields, and a fixed three-column layout.

use std::collections::BTreeSet;
use lineviz_core::{ColumnEdge, ColumnRef, DisplayPolicy, LayoutConfig, LineageGraph, RenderEdge, StatementFacts};
use crate::layering::LayerAssignment;
use crate::layout::compose;
use crate::roles::{resolve_roles, FieldIndex, TableRole, TableRoleSet};
use crate::visibility::{visible_tables, VisibleSet};

/// Table-to-table edges reported by each statement
pub fn statement_table_edges(facts: &[StatementFacts]) -> Vec<RenderEdge> {
    let mut edges = BTreeSet::new();
    for bundle in facts {
        for source in &bundle.sources {
            for target in bundle.targets.iter().filter(|t| *t != source) {
                edges.insert(ColumnEdge::new(
                    ColumnRef::new(source.clone(), ""),
                    ColumnRef::new(target.clone(), ""),
                ));
            }
        }
    }
    edges.into_iter().collect()
}

/// Layer by role alone: sources 0, intermediates 1, targets 2
pub fn layers_by_role(visible: &VisibleSet, roles: &TableRoleSet) -> LayerAssignment {
    visible
        .iter()
        .map(|table| {
            let layer = match roles.role_of(table) {
                Some(TableRole::Source) => 0,
                Some(TableRole::Target) => 2,
                Some(TableRole::Intermediate) | None => 1,
            };
            (table.clone(), layer)
        })
        .collect()
}

/// Build a table-level graph from collected facts
pub fn build_table_graph(facts: &[StatementFacts], policy: &DisplayPolicy, layout: &LayoutConfig) -> LineageGraph {
    let resolved = resolve_roles(facts);
    let visible = visible_tables(&resolved.roles, policy);

    let edges: Vec<RenderEdge> = statement_table_edges(facts)
        .into_iter()
        .filter(|e| visible.contains(&e.from.table) && visible.contains(&e.to.table))
        .collect();

    let layers = layers_by_role(&visible, &resolved.roles);

    tracing::debug!(
        tables = visible.len(),
        edges = edges.len(),
        "built table-level graph"
    );

    compose(&layers, &resolved.roles, &FieldIndex::new(), &edges, layout)
}
