//! Name resolution for CTEs, aliases and table references
//!
//! Walks a query AST and resolves every projected column to the chains of
//! upstream columns it is computed from. A chain runs root first and carries
//! one hop per CTE it passes through; derived subqueries are transparent.

use std::collections::{BTreeSet, HashMap};
use std::ops::ControlFlow;
use sqlparser::ast::{
    visit_relations, Expr, Ident, ObjectName, Query, Select, SelectItem, SetExpr, TableAlias, TableFactor,
    TableWithJoins, Visit, Visitor,
};
use lineviz_core::ColumnRef;

/// Column name used when a wildcard cannot be expanded
pub const WILDCARD_COLUMN: &str = "*";

/// Upstream hop chains feeding one column, root first
pub type Chains = BTreeSet<Vec<ColumnRef>>;

/// Identifier as written, lower-cased unless quoted
pub fn normalize_ident(ident: &Ident) -> String {
    if ident.quote_style.is_some() {
        ident.value.clone()
    } else {
        ident.value.to_lowercase()
    }
}

/// Dotted, normalized object name
pub fn normalize_object_name(name: &ObjectName) -> String {
    name.0.iter().map(normalize_ident).collect::<Vec<_>>().join(".")
}

/// Output columns of a query in projection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub columns: Vec<(String, Chains)>,
}

impl Projection {
    /// Chains of the first column called `name`
    pub fn get(&self, name: &str) -> Option<&Chains> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, chains)| chains)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Union another branch of a set operation into this one, by position
    fn merge_positional(&mut self, other: Projection) {
        for ((_, chains), (_, more)) in self.columns.iter_mut().zip(other.columns) {
            chains.extend(more);
        }
    }
}

/// What a relation in scope knows about its columns
#[derive(Debug, Clone)]
enum RelationColumns {
    /// Columns traced through a CTE or subquery
    Known(Projection),
    /// A table whose columns are not known up front
    Opaque(String),
}

/// A relation in a FROM clause
#[derive(Debug, Clone)]
struct Relation {
    bindings: Vec<String>,
    columns: RelationColumns,
}

impl Relation {
    fn is_bound_to(&self, qualifier: &str) -> bool {
        self.bindings.iter().any(|b| b == qualifier)
    }

    fn exposes(&self, column: &str) -> bool {
        match &self.columns {
            RelationColumns::Known(projection) => projection.get(column).is_some(),
            RelationColumns::Opaque(_) => false,
        }
    }

    fn chains(&self, column: &str) -> Option<Chains> {
        match &self.columns {
            RelationColumns::Known(projection) => projection.get(column).cloned(),
            RelationColumns::Opaque(table) => Some(BTreeSet::from([vec![ColumnRef::new(table.clone(), column)]])),
        }
    }

    /// Columns contributed by `*`
    fn expand(&self) -> Vec<(String, Chains)> {
        match &self.columns {
            RelationColumns::Known(projection) => projection.columns.clone(),
            RelationColumns::Opaque(table) => vec![(
                WILDCARD_COLUMN.to_string(),
                BTreeSet::from([vec![ColumnRef::new(table.clone(), WILDCARD_COLUMN)]]),
            )],
        }
    }
}

/// CTEs visible at a point in the query. `None` marks a CTE whose body is
/// still being resolved, so self references stay opaque.
type CteEnv = HashMap<String, Option<Projection>>;

/// Column references made directly by an expression, not by its subqueries
#[derive(Debug, Default)]
struct ColumnCollector {
    depth: usize,
    references: Vec<Vec<Ident>>,
}

impl Visitor for ColumnCollector {
    type Break = ();

    fn pre_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth -= 1;
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if self.depth == 0 {
            match expr {
                Expr::Identifier(ident) => self.references.push(vec![ident.clone()]),
                Expr::CompoundIdentifier(idents) => self.references.push(idents.clone()),
                _ => {}
            }
        }
        ControlFlow::Continue(())
    }
}

/// Resolves column lineage inside one statement
#[derive(Debug, Default)]
pub struct LineageResolver {
    default_schema: Option<String>,
    cte_names: BTreeSet<String>,
}

impl LineageResolver {
    pub fn new(default_schema: Option<String>) -> Self {
        Self {
            default_schema,
            cte_names: BTreeSet::new(),
        }
    }

    /// Every CTE name defined so far
    pub fn cte_names(&self) -> &BTreeSet<String> {
        &self.cte_names
    }

    /// Prefix single-part physical names with the default schema
    pub fn qualify(&self, table: String) -> String {
        match &self.default_schema {
            Some(schema) if !table.contains('.') => format!("{schema}.{table}"),
            _ => table,
        }
    }

    /// Resolve the projection of a top-level query
    pub fn resolve_query(&mut self, query: &Query) -> Projection {
        self.query(query, &CteEnv::new())
    }

    /// Physical tables read anywhere in `query`, including expression
    /// subqueries. Call after [`resolve_query`](Self::resolve_query) so CTE
    /// references are recognized.
    pub fn physical_tables(&self, query: &Query) -> BTreeSet<String> {
        let mut tables = BTreeSet::new();
        let _ = visit_relations(query, |name| {
            let normalized = normalize_object_name(name);
            if !(name.0.len() == 1 && self.cte_names.contains(&normalized)) {
                tables.insert(self.qualify(normalized));
            }
            ControlFlow::<()>::Continue(())
        });
        tables
    }

    fn query(&mut self, query: &Query, env: &CteEnv) -> Projection {
        let Some(with) = &query.with else {
            return self.set_expr(&query.body, env);
        };

        let mut env = env.clone();
        for cte in &with.cte_tables {
            let name = normalize_ident(&cte.alias.name);
            self.cte_names.insert(name.clone());

            env.insert(name.clone(), None);
            let body = self.query(&cte.query, &env);
            env.insert(name.clone(), Some(through_hop(&name, body)));
        }

        self.set_expr(&query.body, &env)
    }

    fn set_expr(&mut self, body: &SetExpr, env: &CteEnv) -> Projection {
        match body {
            SetExpr::Select(select) => self.select(select, env),
            SetExpr::Query(query) => self.query(query, env),
            SetExpr::SetOperation { left, right, .. } => {
                let mut projection = self.set_expr(left, env);
                let other = self.set_expr(right, env);
                projection.merge_positional(other);
                projection
            }
            _ => Projection::default(),
        }
    }

    fn select(&mut self, select: &Select, env: &CteEnv) -> Projection {
        let mut scope = Vec::new();
        for table_with_joins in &select.from {
            self.table_with_joins(table_with_joins, env, &mut scope);
        }

        let mut projection = Projection::default();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    projection.columns.push((expr_name(expr), expr_chains(expr, &scope)));
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    projection.columns.push((normalize_ident(alias), expr_chains(expr, &scope)));
                }
                SelectItem::Wildcard(_) => {
                    for relation in &scope {
                        projection.columns.extend(relation.expand());
                    }
                }
                SelectItem::QualifiedWildcard(prefix, _) => {
                    let qualifier = normalize_object_name(prefix);
                    match scope.iter().find(|r| r.is_bound_to(&qualifier)) {
                        Some(relation) => projection.columns.extend(relation.expand()),
                        None => tracing::debug!(qualifier = %qualifier, "wildcard qualifier not in scope"),
                    }
                }
            }
        }
        projection
    }

    fn table_with_joins(&mut self, table: &TableWithJoins, env: &CteEnv, scope: &mut Vec<Relation>) {
        self.table_factor(&table.relation, env, scope);
        for join in &table.joins {
            self.table_factor(&join.relation, env, scope);
        }
    }

    fn table_factor(&mut self, factor: &TableFactor, env: &CteEnv, scope: &mut Vec<Relation>) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let normalized = normalize_object_name(name);

                let cte = if name.0.len() == 1 { env.get(&normalized) } else { None };
                let relation = match cte {
                    Some(resolved) => Relation {
                        bindings: alias_or(alias, vec![normalized.clone()]),
                        columns: match resolved {
                            Some(projection) => RelationColumns::Known(projection.clone()),
                            None => RelationColumns::Opaque(normalized),
                        },
                    },
                    None => {
                        let table = self.qualify(normalized.clone());
                        let mut bindings = vec![table.clone(), normalized];
                        if let Some(last) = name.0.last() {
                            bindings.push(normalize_ident(last));
                        }
                        bindings.dedup();
                        Relation {
                            bindings: alias_or(alias, bindings),
                            columns: RelationColumns::Opaque(table),
                        }
                    }
                };
                scope.push(relation);
            }
            TableFactor::Derived { subquery, alias, .. } => {
                let projection = self.query(subquery, env);
                scope.push(Relation {
                    bindings: alias_or(alias, Vec::new()),
                    columns: RelationColumns::Known(projection),
                });
            }
            TableFactor::NestedJoin { table_with_joins, .. } => {
                self.table_with_joins(table_with_joins, env, scope);
            }
            _ => {}
        }
    }
}

fn alias_or(alias: &Option<TableAlias>, fallback: Vec<String>) -> Vec<String> {
    match alias {
        Some(alias) => vec![normalize_ident(&alias.name)],
        None => fallback,
    }
}

/// Extend each column's chains with a hop through relation `name`
fn through_hop(name: &str, projection: Projection) -> Projection {
    let columns = projection
        .columns
        .into_iter()
        .map(|(column, chains)| {
            let hop = ColumnRef::new(name, column.as_str());
            let extended: Chains = if chains.is_empty() {
                BTreeSet::from([vec![hop]])
            } else {
                chains
                    .into_iter()
                    .map(|mut chain| {
                        chain.push(hop.clone());
                        chain
                    })
                    .collect()
            };
            (column, extended)
        })
        .collect();
    Projection { columns }
}

/// Output name of an unaliased projection item
fn expr_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => normalize_ident(ident),
        Expr::CompoundIdentifier(idents) => idents.last().map(normalize_ident).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Chains of every column `expr` reads from `scope`
fn expr_chains(expr: &Expr, scope: &[Relation]) -> Chains {
    let mut collector = ColumnCollector::default();
    let _ = expr.visit(&mut collector);

    let mut chains = Chains::new();
    for reference in &collector.references {
        let resolved = match reference.as_slice() {
            [] => None,
            [column] => resolve_unqualified(&normalize_ident(column), scope),
            [.., qualifier, column] => resolve_qualified(&normalize_ident(qualifier), &normalize_ident(column), scope),
        };
        if let Some(found) = resolved {
            chains.extend(found);
        }
    }
    chains
}

fn resolve_qualified(qualifier: &str, column: &str, scope: &[Relation]) -> Option<Chains> {
    let Some(relation) = scope.iter().find(|r| r.is_bound_to(qualifier)) else {
        tracing::debug!(qualifier, column, "qualifier not in scope, column dropped");
        return None;
    };
    relation.chains(column)
}

fn resolve_unqualified(column: &str, scope: &[Relation]) -> Option<Chains> {
    if let [only] = scope {
        return only.chains(column);
    }

    let exposing: Vec<&Relation> = scope.iter().filter(|r| r.exposes(column)).collect();
    if let [relation] = exposing.as_slice() {
        return relation.chains(column);
    }

    if exposing.is_empty() {
        let opaque: Vec<&Relation> = scope
            .iter()
            .filter(|r| matches!(r.columns, RelationColumns::Opaque(_)))
            .collect();
        if let [relation] = opaque.as_slice() {
            return relation.chains(column);
        }
    }

    tracing::debug!(column, relations = scope.len(), "ambiguous column reference dropped");
    None
}
