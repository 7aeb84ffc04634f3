use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lineviz_core::{Config, DialectConfig, LineageGraph, LineageRequest, NodeRole};
use lineviz_engine::LineageGraphBuilder;
use lineviz_sql::SqlLineageExtractor;

/// lineviz - Column-level lineage graphs for SQL scripts
#[derive(Parser)]
#[command(name = "lineviz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: lineviz.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured extraction and display settings
#[derive(Args, Debug, Default)]
struct DisplayArgs {
    /// SQL dialect (ansi, bigquery, snowflake, postgres, mysql, hive)
    #[arg(long)]
    dialect: Option<String>,

    /// Schema prepended to unqualified table names
    #[arg(long)]
    default_schema: Option<String>,

    /// Collapse every intermediate table
    #[arg(long)]
    no_intermediates: bool,

    /// Also show CTEs and other unqualified intermediates
    #[arg(long)]
    show_ctes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a lineage graph from a SQL script
    Graph {
        /// SQL script file, or '-' for stdin
        input: String,

        #[command(flatten)]
        display: DisplayArgs,

        /// Table-to-table edges without fields
        #[arg(long)]
        table_level: bool,

        /// Write the graph here instead of stdout (always pretty-printed)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON on stdout
        #[arg(long)]
        pretty: bool,
    },

    /// Summarize table roles and layers for a SQL script
    Tables {
        /// SQL script file, or '-' for stdin
        input: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Answer a JSON lineage request
    Request {
        /// Request body file, or '-' for stdin
        body: String,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Write a default config file
    InitConfig {
        /// Destination
        #[arg(short, long, default_value = "lineviz.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    match cli.command {
        Commands::Graph {
            input,
            display,
            table_level,
            output,
            pretty,
        } => graph_command(config, &input, &display, table_level, output.as_deref(), pretty, cli.verbose),
        Commands::Tables { input, display } => tables_command(config, &input, &display),
        Commands::Request { body, pretty } => request_command(&config, &body, pretty),
        Commands::InitConfig { output, force } => init_config_command(&output, force),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)?
    } else if Path::new("lineviz.toml").exists() {
        Config::from_file(Path::new("lineviz.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };
    Ok(config)
}

/// Apply command-line overrides on top of the loaded config
fn apply_overrides(mut config: Config, display: &DisplayArgs) -> Result<Config> {
    if let Some(dialect) = &display.dialect {
        config.dialect = dialect.parse::<DialectConfig>()?;
    }
    if let Some(schema) = &display.default_schema {
        config.default_schema = Some(schema.clone());
    }
    if display.no_intermediates {
        config.display.include_intermediate_tables = false;
    }
    if display.show_ctes {
        config.display.filter_physical_only = false;
    }
    Ok(config)
}

/// Read a file, or stdin for `-`
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }

    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
}

fn graph_json(graph: &LineageGraph, pretty: bool) -> Result<String> {
    let json = if pretty { graph.to_json_pretty()? } else { graph.to_json()? };
    Ok(json)
}

/// Graph command - write the render payload
fn graph_command(
    config: Config,
    input: &str,
    display: &DisplayArgs,
    table_level: bool,
    output: Option<&Path>,
    pretty: bool,
    verbose: bool,
) -> Result<()> {
    let config = apply_overrides(config, display)?;
    let script = read_input(input)?;

    let extractor = SqlLineageExtractor::from_config(&config);
    let builder = LineageGraphBuilder::from_config(&extractor, &config);

    let result = if table_level {
        builder.build_table_level(&script)
    } else {
        builder.build(&script)
    };
    let graph = result.map_err(|e| anyhow::anyhow!("{}", e.to_diagnostic()))?;

    match output {
        Some(path) => {
            graph
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if verbose {
                eprintln!("{} {}", "Graph saved to:".green(), path.display());
            }
        }
        None => println!("{}", graph_json(&graph, pretty)?),
    }

    Ok(())
}

/// Tables command - human-readable role and layer summary
fn tables_command(config: Config, input: &str, display: &DisplayArgs) -> Result<()> {
    let config = apply_overrides(config, display)?;
    let script = read_input(input)?;

    let extractor = SqlLineageExtractor::from_config(&config);
    let analysis = LineageGraphBuilder::from_config(&extractor, &config)
        .analyze(&script)
        .map_err(|e| anyhow::anyhow!("{}", e.to_diagnostic()))?;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Lineage Tables".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if analysis.graph.is_empty() {
        println!("{}", "No tables found".yellow());
        return Ok(());
    }

    for node in &analysis.graph.nodes {
        let role = match node.role {
            NodeRole::Origin => node.role.display_name().green(),
            NodeRole::Middle => node.role.display_name().yellow(),
            NodeRole::Target => node.role.display_name().cyan().bold(),
        };
        let layer = analysis.layers.get(&node.name).copied().unwrap_or_default();

        println!(
            "  {} {} (layer {}, {} fields)",
            role,
            node.name.bold(),
            layer,
            node.fields.len()
        );
    }

    let hidden = analysis.roles.len().saturating_sub(analysis.visible.len());
    println!();
    println!("{} {}", "Edges:".bold(), analysis.graph.edges.len());
    println!("{} {}", "Hidden intermediates:".bold(), hidden);
    println!("{}", "=".repeat(60).bright_blue());

    Ok(())
}

/// Request command - JSON request in, graph or failure envelope out
fn request_command(config: &Config, body: &str, pretty: bool) -> Result<()> {
    let body = read_input(body)?;

    let request = match LineageRequest::from_json(&body) {
        Ok(request) => request,
        Err(e) => {
            println!("{}", e.to_diagnostic().to_json()?);
            std::process::exit(1);
        }
    };

    let extractor = SqlLineageExtractor::from_config(config);
    let builder = LineageGraphBuilder::from_config(&extractor, config).policy(request.policy());

    let result = if request.table_level {
        builder.build_table_level(&request.sql_query)
    } else {
        builder.build(&request.sql_query)
    };

    match result {
        Ok(graph) => {
            println!("{}", graph_json(&graph, pretty)?);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "lineage request failed");
            println!("{}", e.to_diagnostic().to_json()?);
            std::process::exit(1);
        }
    }
}

/// Init config command - write defaults to disk
fn init_config_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    Config::default().save_to_file(output)?;
    eprintln!("{} {}", "Config written to:".green(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn graph_flags_parse() {
        let cli = Cli::try_parse_from([
            "lineviz",
            "-v",
            "graph",
            "script.sql",
            "--no-intermediates",
            "--dialect",
            "bigquery",
            "--pretty",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Graph { input, display, pretty, table_level, .. } => {
                assert_eq!(input, "script.sql");
                assert!(display.no_intermediates);
                assert_eq!(display.dialect.as_deref(), Some("bigquery"));
                assert!(pretty);
                assert!(!table_level);
            }
            _ => panic!("expected graph command"),
        }
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let display = DisplayArgs {
            dialect: Some("snowflake".to_string()),
            default_schema: Some("dw".to_string()),
            no_intermediates: true,
            show_ctes: true,
        };

        let config = apply_overrides(Config::default(), &display).unwrap();
        assert_eq!(config.dialect, DialectConfig::Snowflake);
        assert_eq!(config.default_schema.as_deref(), Some("dw"));
        assert!(!config.display.include_intermediate_tables);
        assert!(!config.display.filter_physical_only);
    }

    #[test]
    fn no_overrides_keeps_config() {
        let config = apply_overrides(Config::default(), &DisplayArgs::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_dialect_rejected() {
        let display = DisplayArgs {
            dialect: Some("oracle".to_string()),
            ..Default::default()
        };
        assert!(apply_overrides(Config::default(), &display).is_err());
    }

    #[test]
    fn missing_input_file_errors() {
        let err = read_input("definitely/not/here.sql").unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.sql"));
    }
}
