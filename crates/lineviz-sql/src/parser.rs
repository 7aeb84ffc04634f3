//! SQL parsing using datafusion-sqlparser-rs
//!
//! Parses a single script fragment into AST statements under a configurable
//! dialect.

use sqlparser::ast::{Query, Statement};
use sqlparser::dialect::{
    BigQueryDialect, Dialect, GenericDialect, HiveDialect, MySqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};
use lineviz_core::{DialectConfig, ExtractError};

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl SqlParser {
    /// Create a new SQL parser with the default (generic) dialect
    pub fn new() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    pub fn bigquery() -> Self {
        Self {
            dialect: Box::new(BigQueryDialect {}),
        }
    }

    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    pub fn snowflake() -> Self {
        Self {
            dialect: Box::new(SnowflakeDialect {}),
        }
    }

    pub fn mysql() -> Self {
        Self {
            dialect: Box::new(MySqlDialect {}),
        }
    }

    pub fn hive() -> Self {
        Self {
            dialect: Box::new(HiveDialect {}),
        }
    }

    /// Create a parser from a dialect config
    pub fn from_dialect(dialect: DialectConfig) -> Self {
        match dialect {
            DialectConfig::BigQuery => Self::bigquery(),
            DialectConfig::Snowflake => Self::snowflake(),
            DialectConfig::Postgres => Self::postgres(),
            DialectConfig::MySql => Self::mysql(),
            DialectConfig::Hive => Self::hive(),
            DialectConfig::Ansi => Self::new(),
        }
    }

    /// Parse SQL string into AST
    pub fn parse(&self, sql: &str) -> Result<ParsedSql, ParseError> {
        Parser::parse_sql(&*self.dialect, sql)
            .map(|statements| ParsedSql { statements })
            .map_err(|error| ParseError {
                sql: sql.to_string(),
                error,
            })
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SqlParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlParser").field("dialect", &self.dialect).finish()
    }
}

/// Successfully parsed SQL
#[derive(Debug, Clone)]
pub struct ParsedSql {
    pub statements: Vec<Statement>,
}

impl ParsedSql {
    pub fn first_statement(&self) -> Option<&Statement> {
        self.statements.first()
    }

    pub fn as_query(&self) -> Option<&Query> {
        match self.first_statement() {
            Some(Statement::Query(query)) => Some(query.as_ref()),
            _ => None,
        }
    }
}

/// SQL parsing error
#[derive(Debug, thiserror::Error)]
#[error("SQL parse error: {error}")]
pub struct ParseError {
    /// Fragment that failed to parse
    pub sql: String,

    /// Parser error from sqlparser
    #[source]
    pub error: ParserError,
}

impl From<ParseError> for ExtractError {
    fn from(err: ParseError) -> Self {
        ExtractError::Parse(err.error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_select() {
        let parser = SqlParser::new();
        let parsed = parser.parse("SELECT id, name FROM users WHERE active = true").unwrap();

        assert_eq!(parsed.statements.len(), 1);
        assert!(parsed.as_query().is_some());
    }

    #[test]
    fn parse_insert_is_not_select() {
        let parser = SqlParser::new();
        let parsed = parser.parse("INSERT INTO t SELECT a FROM s").unwrap();

        assert!(matches!(parsed.first_statement(), Some(Statement::Insert(_))));
        assert!(parsed.as_query().is_none());
    }

    #[test]
    fn parse_invalid_sql() {
        let parser = SqlParser::new();
        let err = parser.parse("SELECT FROM WHERE").unwrap_err();

        assert_eq!(err.sql, "SELECT FROM WHERE");
        let ExtractError::Parse(message) = ExtractError::from(err);
        assert!(!message.is_empty());
    }

    #[test]
    fn different_dialects() {
        let sql = "SELECT id FROM users";

        for dialect in [
            DialectConfig::Ansi,
            DialectConfig::BigQuery,
            DialectConfig::Snowflake,
            DialectConfig::Postgres,
            DialectConfig::MySql,
            DialectConfig::Hive,
        ] {
            assert!(SqlParser::from_dialect(dialect).parse(sql).is_ok(), "{dialect:?}");
        }
    }
}
