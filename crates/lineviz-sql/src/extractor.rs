//! sqlparser-backed lineage extraction engine

use std::collections::BTreeSet;
use sqlparser::ast::{CreateTable, Ident, Insert, Query, Statement};
use lineviz_core::{
    ColumnRef, Config, DialectConfig, ExtractError, Extraction, LineageExtractor, LineagePath, StatementFacts,
};
use crate::parser::SqlParser;
use crate::resolver::{normalize_ident, normalize_object_name, LineageResolver, Projection};

/// Extracts table roles and column lineage from SQL text.
///
/// Understands `INSERT ... SELECT`, `CREATE TABLE ... AS SELECT`,
/// `CREATE VIEW ... AS SELECT` and bare queries. Anything else parses but
/// contributes no facts.
#[derive(Debug)]
pub struct SqlLineageExtractor {
    parser: SqlParser,
    default_schema: Option<String>,
}

impl SqlLineageExtractor {
    pub fn new(dialect: DialectConfig) -> Self {
        Self {
            parser: SqlParser::from_dialect(dialect),
            default_schema: None,
        }
    }

    /// Extractor using the dialect and default schema from `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: SqlParser::from_dialect(config.dialect),
            default_schema: config.default_schema.clone(),
        }
    }

    /// Qualify single-part physical table names with `schema`
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Parse `sql` and collect its facts eagerly
    pub fn extract_facts(&self, sql: &str) -> Result<StatementFacts, ExtractError> {
        let parsed = self.parser.parse(sql)?;

        let mut facts = StatementFacts::default();
        for statement in &parsed.statements {
            let one = self.statement_facts(statement);
            facts.sources.extend(one.sources);
            facts.targets.extend(one.targets);
            facts.intermediates.extend(one.intermediates);
            facts.paths.extend(one.paths);
        }
        Ok(facts)
    }

    fn statement_facts(&self, statement: &Statement) -> StatementFacts {
        match statement {
            Statement::Insert(Insert {
                table_name,
                columns,
                source: Some(source),
                ..
            }) => self.write_facts(&normalize_object_name(table_name), columns, source),
            Statement::CreateTable(CreateTable {
                name,
                columns,
                query: Some(query),
                ..
            }) => {
                let names: Vec<Ident> = columns.iter().map(|c| c.name.clone()).collect();
                self.write_facts(&normalize_object_name(name), &names, query)
            }
            Statement::CreateView { name, columns, query, .. } => {
                let names: Vec<Ident> = columns.iter().map(|c| c.name.clone()).collect();
                self.write_facts(&normalize_object_name(name), &names, query)
            }
            Statement::Query(query) => {
                let mut resolver = LineageResolver::new(self.default_schema.clone());
                resolver.resolve_query(query);
                StatementFacts {
                    sources: resolver.physical_tables(query),
                    intermediates: resolver.cte_names().clone(),
                    ..Default::default()
                }
            }
            other => {
                tracing::debug!(statement = %other, "statement kind carries no lineage");
                StatementFacts::default()
            }
        }
    }

    /// Facts for a statement writing `query` into `target`, with an optional
    /// explicit column list mapped by position.
    fn write_facts(&self, target: &str, target_columns: &[Ident], query: &Query) -> StatementFacts {
        let mut resolver = LineageResolver::new(self.default_schema.clone());
        let target = resolver.qualify(target.to_string());

        let projection = resolver.resolve_query(query);
        let mut sources = resolver.physical_tables(query);
        let mut intermediates = resolver.cte_names().clone();
        let mut targets = BTreeSet::from([target.clone()]);

        if sources.remove(&target) {
            tracing::debug!(table = %target, "table read and written by one statement");
            targets.clear();
            intermediates.insert(target.clone());
        }

        StatementFacts {
            sources,
            targets,
            intermediates,
            paths: target_paths(&target, target_columns, projection),
        }
    }
}

impl Default for SqlLineageExtractor {
    fn default() -> Self {
        Self::new(DialectConfig::default())
    }
}

impl LineageExtractor for SqlLineageExtractor {
    fn extract<'a>(&'a self, statement: &'a str) -> Result<Extraction<'a>, ExtractError> {
        let facts = self.extract_facts(statement)?;
        Ok(Extraction {
            sources: facts.sources,
            targets: facts.targets,
            intermediates: facts.intermediates,
            paths: Box::new(facts.paths.into_iter()),
        })
    }
}

/// One path per upstream chain of every written column. Columns with no
/// upstream still get a single-hop path so the target lists them.
fn target_paths(target: &str, target_columns: &[Ident], projection: Projection) -> Vec<LineagePath> {
    let mut paths = Vec::new();

    for (i, (projected, chains)) in projection.columns.into_iter().enumerate() {
        let column = target_columns.get(i).map(normalize_ident).unwrap_or(projected);
        let written = ColumnRef::new(target, column);

        if chains.is_empty() {
            paths.push(LineagePath::single(written));
            continue;
        }

        for mut chain in chains {
            chain.push(written.clone());
            paths.extend(LineagePath::new(chain));
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn paths(facts: &StatementFacts) -> Vec<String> {
        let mut rendered: Vec<String> = facts.paths.iter().map(ToString::to_string).collect();
        rendered.sort();
        rendered
    }

    fn extract(sql: &str) -> StatementFacts {
        SqlLineageExtractor::default().extract_facts(sql).unwrap()
    }

    #[test]
    fn insert_select_passthrough() {
        let facts = extract("INSERT INTO stage SELECT a FROM raw");

        assert_eq!(facts.sources, set(&["raw"]));
        assert_eq!(facts.targets, set(&["stage"]));
        assert!(facts.intermediates.is_empty());
        assert_eq!(paths(&facts), vec!["raw.a -> stage.a"]);
    }

    #[test]
    fn explicit_column_list_maps_by_position() {
        let facts = extract("INSERT INTO t (x, y) SELECT a, b + c AS z FROM s");
        assert_eq!(paths(&facts), vec!["s.a -> t.x", "s.b -> t.y", "s.c -> t.y"]);
    }

    #[test]
    fn ctas_through_cte() {
        let facts = extract(
            "CREATE TABLE db.out AS \
             WITH recent AS (SELECT id, amount FROM db.orders) \
             SELECT r.id, r.amount * 2 AS doubled FROM recent r",
        );

        assert_eq!(facts.sources, set(&["db.orders"]));
        assert_eq!(facts.targets, set(&["db.out"]));
        assert_eq!(facts.intermediates, set(&["recent"]));
        assert_eq!(
            paths(&facts),
            vec![
                "db.orders.amount -> recent.amount -> db.out.doubled",
                "db.orders.id -> recent.id -> db.out.id",
            ]
        );
    }

    #[test]
    fn join_with_aliases() {
        let facts = extract("INSERT INTO t SELECT o.id, c.name FROM orders o JOIN customers c ON o.cid = c.id");

        assert_eq!(facts.sources, set(&["customers", "orders"]));
        assert_eq!(paths(&facts), vec!["customers.name -> t.name", "orders.id -> t.id"]);
    }

    #[test]
    fn ambiguous_column_keeps_target_field() {
        let facts = extract("INSERT INTO t SELECT id FROM a JOIN b ON a.k = b.k");
        assert_eq!(paths(&facts), vec!["t.id"]);
    }

    #[test]
    fn literal_column_has_single_hop() {
        let facts = extract("INSERT INTO t SELECT 1 AS one, a FROM s");
        assert_eq!(paths(&facts), vec!["s.a -> t.a", "t.one"]);
    }

    #[test]
    fn unknown_wildcard() {
        let facts = extract("INSERT INTO t SELECT * FROM s");
        assert_eq!(paths(&facts), vec!["s.* -> t.*"]);
    }

    #[test]
    fn create_view_with_columns() {
        let facts = extract("CREATE VIEW v (x) AS SELECT a FROM s");
        assert_eq!(facts.targets, set(&["v"]));
        assert_eq!(paths(&facts), vec!["s.a -> v.x"]);
    }

    #[test]
    fn read_and_write_same_table() {
        let facts = extract("INSERT INTO t SELECT a FROM t");

        assert!(facts.sources.is_empty());
        assert!(facts.targets.is_empty());
        assert_eq!(facts.intermediates, set(&["t"]));
    }

    #[test]
    fn subquery_tables_are_sources() {
        let facts = extract("INSERT INTO t SELECT a FROM s WHERE a IN (SELECT a FROM allowed)");

        assert_eq!(facts.sources, set(&["allowed", "s"]));
        assert_eq!(paths(&facts), vec!["s.a -> t.a"]);
    }

    #[test]
    fn bare_query_reports_sources_only() {
        let facts = extract("SELECT a FROM s");

        assert_eq!(facts.sources, set(&["s"]));
        assert!(facts.targets.is_empty());
        assert!(facts.paths.is_empty());
    }

    #[test]
    fn default_schema_qualifies_physical_names() {
        let extractor = SqlLineageExtractor::default().with_default_schema("dw");
        let facts = extractor.extract_facts("INSERT INTO stage SELECT a FROM raw_orders").unwrap();

        assert_eq!(facts.sources, set(&["dw.raw_orders"]));
        assert_eq!(facts.targets, set(&["dw.stage"]));
        assert_eq!(paths(&facts), vec!["dw.raw_orders.a -> dw.stage.a"]);
    }

    #[test]
    fn unsupported_statement_is_empty() {
        let facts = extract("DELETE FROM t WHERE a = 1");
        assert!(facts.is_empty());
    }

    #[test]
    fn parse_failure() {
        let err = SqlLineageExtractor::default()
            .extract_facts("SELECT FROM WHERE")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn extraction_contract() {
        let extractor = SqlLineageExtractor::new(DialectConfig::Postgres);
        let extraction = extractor.extract("INSERT INTO t SELECT a FROM s").unwrap();

        assert_eq!(extraction.targets, set(&["t"]));
        assert_eq!(extraction.into_facts().paths.len(), 1);
    }

    #[test]
    fn from_config_uses_dialect_and_schema() {
        let config = Config {
            dialect: DialectConfig::BigQuery,
            default_schema: Some("analytics".to_string()),
            ..Default::default()
        };
        let facts = SqlLineageExtractor::from_config(&config)
            .extract_facts("INSERT INTO t SELECT a FROM `proj.ds.src`")
            .unwrap();

        assert_eq!(facts.targets, set(&["analytics.t"]));
        assert_eq!(facts.sources.len(), 1);
    }
}
