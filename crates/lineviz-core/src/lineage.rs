//! Column-level lineage value types
//!
//! These are the normalized shapes every extraction engine reports and every
//! pipeline stage consumes. All of them are plain immutable values.

use serde::{Deserialize, Serialize};

/// Separator between qualifier parts in a table name (`schema.table`)
pub const QUALIFIER_SEPARATOR: char = '.';

/// Reference to a single column of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table (or CTE) name, possibly qualified
    pub table: String,

    /// Column name
    pub field: String,
}

impl ColumnRef {
    /// Create a new column reference
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

/// One traced flow of data through a statement, from an originating column
/// to a derived column. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnRef>", into = "Vec<ColumnRef>")]
pub struct LineagePath {
    hops: Vec<ColumnRef>,
}

impl LineagePath {
    /// Build a path from its hops. Returns `None` for an empty hop list.
    pub fn new(hops: Vec<ColumnRef>) -> Option<Self> {
        if hops.is_empty() {
            None
        } else {
            Some(Self { hops })
        }
    }

    /// A path consisting of a single column
    pub fn single(column: ColumnRef) -> Self {
        Self { hops: vec![column] }
    }

    /// All hops, origin first
    pub fn hops(&self) -> &[ColumnRef] {
        &self.hops
    }

    /// Number of hops (always at least one)
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Always false; present for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Rename every hop on table `from` to table `to`
    pub fn rename_table(self, from: &str, to: &str) -> Self {
        let hops = self
            .hops
            .into_iter()
            .map(|hop| {
                if hop.table == from {
                    ColumnRef::new(to, hop.field)
                } else {
                    hop
                }
            })
            .collect();
        Self { hops }
    }

    /// Edges between consecutive hops that cross a table boundary.
    ///
    /// Hops within the same table carry no rendering information and are
    /// skipped; a single-hop path yields nothing.
    pub fn edges(&self) -> impl Iterator<Item = ColumnEdge> + '_ {
        self.hops
            .windows(2)
            .filter(|pair| pair[0].table != pair[1].table)
            .map(|pair| ColumnEdge::new(pair[0].clone(), pair[1].clone()))
    }
}

impl TryFrom<Vec<ColumnRef>> for LineagePath {
    type Error = String;

    fn try_from(hops: Vec<ColumnRef>) -> Result<Self, Self::Error> {
        Self::new(hops).ok_or_else(|| "lineage path must contain at least one column".to_string())
    }
}

impl From<LineagePath> for Vec<ColumnRef> {
    fn from(path: LineagePath) -> Self {
        path.hops
    }
}

impl std::fmt::Display for LineagePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", hop)?;
        }
        Ok(())
    }
}

/// Directed field-to-field dependency.
///
/// Ordering is lexicographic over (from table, from field, to table, to field),
/// which is the order edges are emitted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnEdge {
    pub from: ColumnRef,
    pub to: ColumnRef,
}

impl ColumnEdge {
    pub fn new(from: ColumnRef, to: ColumnRef) -> Self {
        Self { from, to }
    }

    /// True when both endpoints live in the same table
    pub fn is_self_referential(&self) -> bool {
        self.from.table == self.to.table
    }
}

/// Edge derived directly from adjacent hops of a lineage path
pub type RawEdge = ColumnEdge;

/// Edge connecting two visible tables, ready for rendering
pub type RenderEdge = ColumnEdge;

/// Whether a table name carries a schema/database qualifier.
///
/// Qualified names denote physical tables; bare names are treated as CTEs.
pub fn is_qualified(table: &str) -> bool {
    table.contains(QUALIFIER_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(table: &str, field: &str) -> ColumnRef {
        ColumnRef::new(table, field)
    }

    #[test]
    fn empty_path_rejected() {
        assert!(LineagePath::new(Vec::new()).is_none());
        assert!(serde_json::from_str::<LineagePath>("[]").is_err());
    }

    #[test]
    fn path_edges_skip_same_table_hops() {
        let path = LineagePath::new(vec![
            col("raw", "a"),
            col("raw", "b"),
            col("stage", "a"),
            col("final", "a"),
        ])
        .unwrap();

        let edges: Vec<_> = path.edges().collect();
        assert_eq!(
            edges,
            vec![
                ColumnEdge::new(col("raw", "b"), col("stage", "a")),
                ColumnEdge::new(col("stage", "a"), col("final", "a")),
            ]
        );
    }

    #[test]
    fn single_hop_path_has_no_edges() {
        let path = LineagePath::single(col("raw", "a"));
        assert_eq!(path.edges().count(), 0);
        assert_eq!(path.hops(), &[col("raw", "a")]);
    }

    #[test]
    fn rename_table_touches_matching_hops_only() {
        let path = LineagePath::new(vec![col("raw", "a"), col("c", "a"), col("final", "a")]).unwrap();
        assert_eq!(path.rename_table("c", "c#2").to_string(), "raw.a -> c#2.a -> final.a");
    }

    #[test]
    fn edge_ordering_is_lexicographic() {
        let mut edges = vec![
            ColumnEdge::new(col("b", "x"), col("c", "x")),
            ColumnEdge::new(col("a", "z"), col("c", "x")),
            ColumnEdge::new(col("a", "y"), col("d", "x")),
            ColumnEdge::new(col("a", "y"), col("c", "z")),
        ];
        edges.sort();

        let flat: Vec<String> = edges
            .iter()
            .map(|e| format!("{}>{}", e.from, e.to))
            .collect();
        assert_eq!(flat, vec!["a.y>c.z", "a.y>d.x", "a.z>c.x", "b.x>c.x"]);
    }

    #[test]
    fn qualified_names() {
        assert!(is_qualified("db.orders"));
        assert!(!is_qualified("recent_orders"));
    }

    #[test]
    fn path_display() {
        let path = LineagePath::new(vec![col("raw", "a"), col("final", "a")]).unwrap();
        assert_eq!(path.to_string(), "raw.a -> final.a");
    }
}
