//! Render-ready lineage graph payload
//!
//! This is the stable output format consumed by the front end.
//! Field names and the `type` labels are part of the wire contract.

use serde::{Deserialize, Serialize};
use crate::lineage::RenderEdge;

/// Role of a table in the rendered graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Table only read from
    Origin,

    /// Staging table or CTE between sources and targets
    Middle,

    /// Table only written to (labelled "RS" on the wire)
    #[serde(rename = "RS")]
    Target,
}

impl NodeRole {
    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "Origin",
            Self::Middle => "Middle",
            Self::Target => "RS",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Origin => "Origin",
            Self::Middle => "Intermediate",
            Self::Target => "Target",
        }
    }

    /// Grouping rank in the final node list
    pub fn rank(&self) -> u8 {
        match self {
            Self::Origin => 0,
            Self::Middle => 1,
            Self::Target => 2,
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field entry of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeField {
    pub name: String,
}

/// A positioned table node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Table name
    pub name: String,

    /// Role label
    #[serde(rename = "type")]
    pub role: NodeRole,

    /// Fields, ascending by name
    pub fields: Vec<NodeField>,

    /// X coordinate in pixels
    pub left: i64,

    /// Y coordinate in pixels
    pub top: i64,
}

/// One end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    pub name: String,
    pub field: String,
}

/// Field-to-field edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
}

impl From<&RenderEdge> for GraphEdge {
    fn from(edge: &RenderEdge) -> Self {
        Self {
            from: EdgeEndpoint {
                name: edge.from.table.clone(),
                field: edge.from.field.clone(),
            },
            to: EdgeEndpoint {
                name: edge.to.table.clone(),
                field: edge.to.field.clone(),
            },
        }
    }
}

/// Lineage graph payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl LineageGraph {
    /// An empty graph
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the graph has neither nodes nor edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Find a node by table name
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json_pretty()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
