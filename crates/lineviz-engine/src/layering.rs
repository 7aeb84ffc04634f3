//! Layer assignment
//!
//! Places every visible table on a discrete horizontal layer following
//! data-flow direction: sources and upstream-less intermediates on layer 0,
//! targets on the last layer, and everything in between one layer right of
//! its right-most upstream table.
//!
//! Cyclic lineage among intermediates gets a best-effort layering: the
//! first cycle member reached anchors the rest.

use std::collections::{BTreeMap, HashMap, HashSet};
use lineviz_core::RenderEdge;
use crate::graph::TableGraph;
use crate::roles::TableRoleSet;
use crate::visibility::VisibleSet;

/// Table name -> layer index
pub type LayerAssignment = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

/// Tables reachable from the roots without passing through a target, and
/// the edges that close a cycle on the way (first-reached member wins).
fn explore<'a>(
    graph: &'a TableGraph,
    roots: impl Iterator<Item = &'a str>,
    is_stop: impl Fn(&str) -> bool,
) -> (HashSet<&'a str>, HashSet<(&'a str, &'a str)>) {
    let children = |table: &str| -> Vec<&'a str> {
        let mut next: Vec<&'a str> = graph
            .children(table)
            .map(String::as_str)
            .filter(|c| !is_stop(c))
            .collect();
        next.reverse();
        next
    };

    let mut state: HashMap<&'a str, Visit> = HashMap::new();
    let mut back_edges = HashSet::new();

    for root in roots {
        if state.contains_key(root) {
            continue;
        }
        state.insert(root, Visit::Open);
        let mut stack: Vec<(&'a str, Vec<&'a str>)> = vec![(root, children(root))];

        loop {
            let Some((node, pending)) = stack.last_mut() else {
                break;
            };
            let node = *node;

            match pending.pop() {
                Some(child) => match state.get(child) {
                    Some(Visit::Open) => {
                        back_edges.insert((node, child));
                    }
                    Some(Visit::Done) => {}
                    None => {
                        state.insert(child, Visit::Open);
                        stack.push((child, children(child)));
                    }
                },
                None => {
                    state.insert(node, Visit::Done);
                    stack.pop();
                }
            }
        }
    }

    (state.into_keys().collect(), back_edges)
}

/// Assign layers to every visible table.
///
/// Sources sit on layer 0, as do intermediates with no upstream table.
/// Other non-target tables reachable from those roots take
/// `max(upstream) + 1` by repeated passes in which a layer only grows;
/// edges closing a cycle are ignored so the passes reach a fixed point.
/// Tables no root reaches (cycles fed by nothing, or fed only by a target)
/// default to 0. Targets are placed one layer right of every other table,
/// whether or not anything feeds them.
pub fn assign_layers(visible: &VisibleSet, roles: &TableRoleSet, edges: &[RenderEdge]) -> LayerAssignment {
    let graph = TableGraph::from_edges(edges);

    let orphans = visible
        .iter()
        .filter(|t| !roles.is_source(t) && !roles.is_target(t))
        .filter(|t| graph.parents(t).next().is_none());
    let roots: Vec<&str> = visible
        .iter()
        .filter(|t| roles.is_source(t))
        .chain(orphans)
        .map(String::as_str)
        .collect();

    let (reachable, back_edges) = explore(&graph, roots.iter().copied(), |t| roles.is_target(t));

    let mut assigned: BTreeMap<&str, usize> = roots.iter().map(|t| (*t, 0)).collect();

    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut changed = false;

        for table in visible.iter().map(String::as_str) {
            if roles.is_target(table) || !reachable.contains(table) || roots.contains(&table) {
                continue;
            }

            let candidate = graph
                .parents(table)
                .map(String::as_str)
                .filter(|parent| !back_edges.contains(&(*parent, table)))
                .filter_map(|parent| assigned.get(parent).copied())
                .max()
                .map(|layer| layer + 1);

            if let Some(layer) = candidate {
                if assigned.get(table).map_or(true, |current| layer > *current) {
                    assigned.insert(table, layer);
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    let mut layers = LayerAssignment::new();
    for table in visible.iter().filter(|t| !roles.is_target(t)) {
        let layer = assigned.get(table.as_str()).copied().unwrap_or_else(|| {
            tracing::debug!(table = %table, "table unreachable from any root placed on layer 0");
            0
        });
        layers.insert(table.clone(), layer);
    }

    let target_layer = layers.values().copied().max().unwrap_or(0) + 1;
    for table in visible.iter().filter(|t| roles.is_target(t)) {
        layers.insert(table.clone(), target_layer);
    }

    tracing::debug!(
        passes,
        cycles = back_edges.len(),
        layers = target_layer + 1,
        "assigned layers"
    );

    layers
}
