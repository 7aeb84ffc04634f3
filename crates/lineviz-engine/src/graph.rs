//! Dependency graph construction and traversal
//!
//! Column-granular graph used to trace lineage through hidden tables, and a
//! collapsed table-level graph used for layering.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use lineviz_core::{ColumnEdge, ColumnRef};

/// Direction to walk when tracing lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow data flow towards derived columns
    Downstream,

    /// Follow data flow back towards originating columns
    Upstream,
}

/// Column dependency graph with forward and reverse edges
#[derive(Debug, Clone, Default)]
pub struct ColumnGraph {
    /// Forward edges: column -> columns derived from it
    children: HashMap<ColumnRef, Vec<ColumnRef>>,

    /// Reverse edges: column -> columns it is derived from
    parents: HashMap<ColumnRef, Vec<ColumnRef>>,
}

impl ColumnGraph {
    /// Build the graph from a list of edges
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a ColumnEdge>) -> Self {
        let mut children: HashMap<ColumnRef, Vec<ColumnRef>> = HashMap::new();
        let mut parents: HashMap<ColumnRef, Vec<ColumnRef>> = HashMap::new();

        for edge in edges {
            children
                .entry(edge.from.clone())
                .or_default()
                .push(edge.to.clone());

            parents
                .entry(edge.to.clone())
                .or_default()
                .push(edge.from.clone());
        }

        Self { children, parents }
    }

    /// Immediate neighbours of a column in the given direction
    pub fn neighbours(&self, column: &ColumnRef, direction: Direction) -> &[ColumnRef] {
        let map = match direction {
            Direction::Downstream => &self.children,
            Direction::Upstream => &self.parents,
        };

        map.get(column).map(Vec::as_slice).unwrap_or_default()
    }

    /// Find the nearest columns satisfying `is_stop`, walking from `start`.
    ///
    /// `start` itself is never reported. A column satisfying `is_stop` is
    /// recorded and not expanded further. Each column is expanded at most
    /// once per call, so cycles terminate.
    pub fn nearest_matching<F>(
        &self,
        start: &ColumnRef,
        direction: Direction,
        is_stop: F,
    ) -> BTreeSet<ColumnRef>
    where
        F: Fn(&ColumnRef) -> bool,
    {
        let mut visited: HashSet<&ColumnRef> = HashSet::new();
        let mut stack: Vec<&ColumnRef> = Vec::new();
        let mut found = BTreeSet::new();

        visited.insert(start);
        stack.extend(self.neighbours(start, direction));

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            if is_stop(current) {
                found.insert(current.clone());
                continue;
            }

            for next in self.neighbours(current, direction) {
                if !visited.contains(next) {
                    stack.push(next);
                }
            }
        }

        found
    }
}

/// Table-level dependency graph; parallel column edges collapse to one
#[derive(Debug, Clone, Default)]
pub struct TableGraph {
    /// table -> tables it reads from
    parents: BTreeMap<String, BTreeSet<String>>,

    /// table -> tables reading from it
    children: BTreeMap<String, BTreeSet<String>>,
}

impl TableGraph {
    /// Collapse column edges onto their tables. Self-edges are ignored.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a ColumnEdge>) -> Self {
        let mut graph = Self::default();

        for edge in edges {
            if edge.is_self_referential() {
                continue;
            }
            graph.add_edge(&edge.from.table, &edge.to.table);
        }

        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        self.parents
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());

        self.children
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Immediate upstream tables
    pub fn parents(&self, table: &str) -> impl Iterator<Item = &String> {
        self.parents.get(table).into_iter().flatten()
    }

    /// Immediate downstream tables
    pub fn children(&self, table: &str) -> impl Iterator<Item = &String> {
        self.children.get(table).into_iter().flatten()
    }
}
