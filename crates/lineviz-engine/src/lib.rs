//! lineviz engine
//!
//! Turns a multi-statement SQL script into a layered, positioned lineage
//! graph. The pipeline is a sequence of pure stages:
//!
//! 1. [`collector`] runs the extraction engine on every statement
//! 2. [`roles`] merges facts into global source / target / intermediate sets
//! 3. [`visibility`] applies the display policy
//! 4. [`reachability`] routes lineage around hidden tables
//! 5. [`layering`] assigns horizontal layers
//! 6. [`layout`] positions nodes and produces the payload
//!
//! [`LineageGraphBuilder`] drives all of them.

pub mod collector;
pub mod error;
pub mod graph;
pub mod layering;
pub mod layout;
pub mod pipeline;
pub mod reachability;
pub mod roles;
pub mod table_level;
pub mod visibility;

pub use collector::FactCollector;
pub use error::LineageError;
pub use graph::{ColumnGraph, Direction, TableGraph};
pub use layering::{assign_layers, LayerAssignment};
pub use layout::{compose, node_role};
pub use pipeline::{LineageAnalysis, LineageGraphBuilder};
pub use reachability::resolve_render_edges;
pub use roles::{resolve_roles, FieldIndex, ResolvedFacts, TableRole, TableRoleSet};
pub use table_level::build_table_graph;
pub use visibility::{visible_tables, VisibleSet};
