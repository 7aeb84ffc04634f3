//! Edge reachability
//!
//! Rewrites raw column edges into render edges between visible tables. When
//! one end of an edge is hidden, lineage is traced through the hidden
//! columns until visible ones are reached, so collapsing a table never loses
//! provenance. Tracing is column-precise: a hidden table can route different
//! fields to different visible descendants.

use std::collections::BTreeSet;
use lineviz_core::{ColumnEdge, ColumnRef, RawEdge, RenderEdge};
use crate::graph::{ColumnGraph, Direction};
use crate::visibility::VisibleSet;

/// Resolve render edges; the result is deduplicated, free of self-loops and
/// sorted by (from table, from field, to table, to field).
pub fn resolve_render_edges(raw_edges: &[RawEdge], visible: &VisibleSet) -> Vec<RenderEdge> {
    let graph = ColumnGraph::from_edges(raw_edges);
    let is_visible = |c: &ColumnRef| visible.contains(&c.table);

    let mut resolved: BTreeSet<RenderEdge> = BTreeSet::new();
    let mut traced = 0usize;

    for edge in raw_edges {
        let from_visible = is_visible(&edge.from);
        let to_visible = is_visible(&edge.to);

        match (from_visible, to_visible) {
            (true, true) => {
                resolved.insert(edge.clone());
            }
            (true, false) => {
                traced += 1;
                for reached in graph.nearest_matching(&edge.to, Direction::Downstream, is_visible) {
                    resolved.insert(ColumnEdge::new(edge.from.clone(), reached));
                }
            }
            (false, true) => {
                traced += 1;
                for reached in graph.nearest_matching(&edge.from, Direction::Upstream, is_visible) {
                    resolved.insert(ColumnEdge::new(reached, edge.to.clone()));
                }
            }
            // Both ends hidden: only reachable through the searches above.
            (false, false) => {}
        }
    }

    resolved.retain(|e| !e.is_self_referential());

    tracing::debug!(
        raw = raw_edges.len(),
        traced,
        rendered = resolved.len(),
        "resolved render edges"
    );

    resolved.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: (&str, &str), to: (&str, &str)) -> ColumnEdge {
        ColumnEdge::new(ColumnRef::new(from.0, from.1), ColumnRef::new(to.0, to.1))
    }

    fn visible(tables: &[&str]) -> VisibleSet {
        tables.iter().map(|t| t.to_string()).collect()
    }

    fn render(edges: &[RenderEdge]) -> Vec<String> {
        edges.iter().map(|e| format!("{}>{}", e.from, e.to)).collect()
    }

    #[test]
    fn visible_edges_pass_through() {
        let raw = vec![edge(("raw", "a"), ("stage", "a")), edge(("stage", "a"), ("final", "a"))];
        let edges = resolve_render_edges(&raw, &visible(&["raw", "stage", "final"]));
        assert_eq!(render(&edges), vec!["raw.a>stage.a", "stage.a>final.a"]);
    }

    #[test]
    fn hidden_table_is_bridged() {
        let raw = vec![edge(("raw", "a"), ("stage", "a")), edge(("stage", "a"), ("final", "a"))];
        let edges = resolve_render_edges(&raw, &visible(&["raw", "final"]));
        assert_eq!(render(&edges), vec!["raw.a>final.a"]);
    }

    #[test]
    fn chain_of_hidden_tables() {
        let raw = vec![
            edge(("raw", "a"), ("c1", "a")),
            edge(("c1", "a"), ("c2", "b")),
            edge(("c2", "b"), ("final", "x")),
        ];
        let edges = resolve_render_edges(&raw, &visible(&["raw", "final"]));
        assert_eq!(render(&edges), vec!["raw.a>final.x"]);
    }

    #[test]
    fn hidden_fan_out_is_column_precise() {
        let raw = vec![
            edge(("raw", "a"), ("cte", "a")),
            edge(("raw", "b"), ("cte", "b")),
            edge(("cte", "a"), ("out1", "a")),
            edge(("cte", "b"), ("out2", "b")),
        ];
        let edges = resolve_render_edges(&raw, &visible(&["raw", "out1", "out2"]));
        assert_eq!(render(&edges), vec!["raw.a>out1.a", "raw.b>out2.b"]);
    }

    #[test]
    fn hidden_cycle_terminates() {
        let raw = vec![
            edge(("raw", "a"), ("h1", "a")),
            edge(("h1", "a"), ("h2", "a")),
            edge(("h2", "a"), ("h1", "a")),
            edge(("h2", "a"), ("final", "a")),
        ];
        let edges = resolve_render_edges(&raw, &visible(&["raw", "final"]));
        assert_eq!(render(&edges), vec!["raw.a>final.a"]);
    }

    #[test]
    fn traced_self_loop_is_dropped() {
        let raw = vec![edge(("t", "a"), ("h", "a")), edge(("h", "a"), ("t", "b"))];
        let edges = resolve_render_edges(&raw, &visible(&["t"]));
        assert!(edges.is_empty());
    }

    #[test]
    fn duplicates_collapse_and_output_is_sorted() {
        let raw = vec![
            edge(("z", "a"), ("y", "a")),
            edge(("b", "a"), ("y", "a")),
            edge(("b", "a"), ("y", "a")),
        ];
        let edges = resolve_render_edges(&raw, &visible(&["b", "y", "z"]));
        assert_eq!(render(&edges), vec!["b.a>y.a", "z.a>y.a"]);
    }

    #[test]
    fn dead_end_hidden_branch_emits_nothing() {
        let raw = vec![edge(("raw", "a"), ("cte", "a"))];
        let edges = resolve_render_edges(&raw, &visible(&["raw"]));
        assert!(edges.is_empty());
    }
}
