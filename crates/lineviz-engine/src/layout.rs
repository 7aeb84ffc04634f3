//! Layout composition
//!
//! Orders nodes within each layer and assigns pixel coordinates.

use std::collections::BTreeMap;
use lineviz_core::{GraphEdge, GraphNode, LayoutConfig, LineageGraph, NodeField, NodeRole, RenderEdge};
use crate::layering::LayerAssignment;
use crate::roles::{FieldIndex, TableRole, TableRoleSet};

/// Node role for a table. Tables without any recorded role render as
/// intermediates.
pub fn node_role(roles: &TableRoleSet, table: &str) -> NodeRole {
    match roles.role_of(table) {
        Some(TableRole::Source) => NodeRole::Origin,
        Some(TableRole::Target) => NodeRole::Target,
        Some(TableRole::Intermediate) | None => NodeRole::Middle,
    }
}

/// Compose the final payload from layered tables and render edges.
///
/// Within a layer, tables with more fields come first, ties broken by name.
/// The returned node list is grouped Origin, Middle, Target and then ordered
/// by position.
pub fn compose(
    layers: &LayerAssignment,
    roles: &TableRoleSet,
    fields: &FieldIndex,
    edges: &[RenderEdge],
    config: &LayoutConfig,
) -> LineageGraph {
    let field_count = |table: &str| fields.get(table).map_or(0, |f| f.len());

    let mut by_layer: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (table, layer) in layers {
        by_layer.entry(*layer).or_default().push(table.as_str());
    }

    let mut nodes = Vec::with_capacity(layers.len());
    for (layer, tables) in &mut by_layer {
        tables.sort_by(|a, b| field_count(b).cmp(&field_count(a)).then_with(|| a.cmp(b)));

        let left = config.layer_x(*layer);
        let mut top = config.start_y;

        for table in tables.iter() {
            let node_fields: Vec<NodeField> = fields
                .get(*table)
                .into_iter()
                .flatten()
                .map(|name| NodeField { name: name.clone() })
                .collect();

            let height = config.node_height(node_fields.len());

            nodes.push(GraphNode {
                name: table.to_string(),
                role: node_role(roles, table),
                fields: node_fields,
                left,
                top,
            });

            top += height + config.vertical_spacing;
        }
    }

    nodes.sort_by(|a, b| {
        a.role
            .rank()
            .cmp(&b.role.rank())
            .then(a.left.cmp(&b.left))
            .then(a.top.cmp(&b.top))
    });

    LineageGraph {
        nodes,
        edges: edges.iter().map(GraphEdge::from).collect(),
    }
}
