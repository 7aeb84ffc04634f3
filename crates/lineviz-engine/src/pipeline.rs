//! Pipeline driver
//!
//! Wires fact collection, role resolution, visibility, edge reachability,
//! layering and layout into a single request.

use lineviz_core::{Config, DialectConfig, DisplayPolicy, LayoutConfig, LineageExtractor, LineageGraph, RenderEdge, DEFAULT_DELIMITER};
use crate::collector::FactCollector;
use crate::error::LineageError;
use crate::layering::{assign_layers, LayerAssignment};
use crate::layout::compose;
use crate::reachability::resolve_render_edges;
use crate::roles::{resolve_roles, TableRoleSet};
use crate::table_level::build_table_graph;
use crate::visibility::{visible_tables, VisibleSet};

/// Intermediate results of a column-level run, for callers that want more
/// than the final payload.
#[derive(Debug, Clone, Default)]
pub struct LineageAnalysis {
    pub roles: TableRoleSet,
    pub visible: VisibleSet,
    pub render_edges: Vec<RenderEdge>,
    pub layers: LayerAssignment,
    pub graph: LineageGraph,
}

/// Builds lineage graphs from SQL scripts
pub struct LineageGraphBuilder<'e, E: LineageExtractor + ?Sized> {
    extractor: &'e E,
    policy: DisplayPolicy,
    layout: LayoutConfig,
    delimiter: char,
    dialect: DialectConfig,
}

impl<'e, E: LineageExtractor + ?Sized> LineageGraphBuilder<'e, E> {
    pub fn new(extractor: &'e E) -> Self {
        Self {
            extractor,
            policy: DisplayPolicy::default(),
            layout: LayoutConfig::default(),
            delimiter: DEFAULT_DELIMITER,
            dialect: DialectConfig::default(),
        }
    }

    /// Builder with display policy, layout, delimiter and dialect taken
    /// from `config`
    pub fn from_config(extractor: &'e E, config: &Config) -> Self {
        Self::new(extractor)
            .policy(config.display)
            .layout(config.layout)
            .delimiter(config.delimiter)
            .dialect(config.dialect)
    }

    pub fn policy(mut self, policy: DisplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Dialect whose string quoting governs statement splitting
    pub fn dialect(mut self, dialect: DialectConfig) -> Self {
        self.dialect = dialect;
        self
    }

    fn collector(&self) -> FactCollector<'e, E> {
        FactCollector::new(self.extractor)
            .with_delimiter(self.delimiter)
            .with_dialect(self.dialect)
    }

    /// Column-level graph for `script`
    pub fn build(&self, script: &str) -> Result<LineageGraph, LineageError> {
        self.analyze(script).map(|analysis| analysis.graph)
    }

    /// Column-level graph plus the intermediate results that produced it
    pub fn analyze(&self, script: &str) -> Result<LineageAnalysis, LineageError> {
        if script.trim().is_empty() {
            return Ok(LineageAnalysis::default());
        }

        let facts = self.collector().collect(script)?;

        let resolved = resolve_roles(&facts);
        let visible = visible_tables(&resolved.roles, &self.policy);
        let render_edges = resolve_render_edges(&resolved.raw_edges, &visible);
        let layers = assign_layers(&visible, &resolved.roles, &render_edges);
        let graph = compose(&layers, &resolved.roles, &resolved.fields, &render_edges, &self.layout);

        tracing::info!(
            statements = facts.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built column lineage graph"
        );

        Ok(LineageAnalysis {
            roles: resolved.roles,
            visible,
            render_edges,
            layers,
            graph,
        })
    }

    /// Table-level graph for `script`
    pub fn build_table_level(&self, script: &str) -> Result<LineageGraph, LineageError> {
        if script.trim().is_empty() {
            return Ok(LineageGraph::empty());
        }

        let facts = self.collector().collect(script)?;

        let graph = build_table_graph(&facts, &self.policy, &self.layout);

        tracing::info!(
            statements = facts.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built table lineage graph"
        );

        Ok(graph)
    }
}
