//! Configuration schema (lineviz.toml)

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::script::DEFAULT_DELIMITER;

/// SQL dialect configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// BigQuery SQL dialect
    BigQuery,

    /// Snowflake SQL dialect
    Snowflake,

    /// PostgreSQL SQL dialect
    Postgres,

    /// MySQL SQL dialect
    MySql,

    /// Hive SQL dialect
    Hive,

    /// Generic ANSI SQL
    #[default]
    Ansi,
}

impl std::str::FromStr for DialectConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bigquery" => Ok(Self::BigQuery),
            "snowflake" => Ok(Self::Snowflake),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "hive" => Ok(Self::Hive),
            "ansi" | "generic" => Ok(Self::Ansi),
            other => Err(ConfigError::UnknownDialect(other.to_string())),
        }
    }
}

/// Which intermediate tables become visible nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPolicy {
    /// Render intermediate tables at all. When false every intermediate is
    /// collapsed and its lineage re-routed.
    #[serde(default = "default_true")]
    pub include_intermediate_tables: bool,

    /// Only render qualified (physical) intermediates, hiding CTEs
    #[serde(default = "default_true", alias = "filter_ctes")]
    pub filter_physical_only: bool,
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self {
            include_intermediate_tables: true,
            filter_physical_only: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Pixel geometry used by the layout compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left margin of layer 0
    pub start_x: i64,

    /// Top margin of every layer
    pub start_y: i64,

    /// Height of a node with no fields (title + padding)
    pub node_base_height: i64,

    /// Height added per field
    pub field_height: i64,

    /// Gap between stacked nodes
    pub vertical_spacing: i64,

    /// Horizontal distance between layers
    pub layer_spacing: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 20,
            start_y: 20,
            node_base_height: 60,
            field_height: 25,
            vertical_spacing: 20,
            layer_spacing: 850,
        }
    }
}

impl LayoutConfig {
    /// Rendered height of a node with `field_count` fields
    pub fn node_height(&self, field_count: usize) -> i64 {
        self.node_base_height + field_count as i64 * self.field_height
    }

    /// X coordinate of a layer
    pub fn layer_x(&self, layer: usize) -> i64 {
        self.start_x + layer as i64 * self.layer_spacing
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL dialect
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Schema prepended to unqualified physical table names
    #[serde(default)]
    pub default_schema: Option<String>,

    /// Statement delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Display policy
    #[serde(default)]
    pub display: DisplayPolicy,

    /// Layout geometry
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            default_schema: None,
            delimiter: DEFAULT_DELIMITER,
            display: DisplayPolicy::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),
}

impl ConfigError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::IoError(_) => DiagnosticCode::IoError,
            _ => DiagnosticCode::ConfigError,
        };
        Diagnostic::new(code, self.to_string())
    }
}
