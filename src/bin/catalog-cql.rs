//! Catalog CQL CLI
//!
//! Command-line interface for checking query expressions against a source's
//! filter capabilities and rendering them as CQL.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use catalog_cql::{
    load_capabilities, load_config, load_document, parse_date, CapabilitySet, DialectName,
    FixedClock, PredicateNode, QueryExpr, SourceConfig,
};
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "catalog-cql")]
#[command(about = "Build capability-checked catalog filters and render them as CQL")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a query expression as CQL
    Render {
        /// Query expression file (JSON)
        query: PathBuf,

        /// Capability document: file path or URL (http:// or https://)
        #[arg(long, short)]
        capabilities: String,

        /// Source configuration file (mapping, axis order, dialect, unit)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured dialect: standard or legacy
        #[arg(long)]
        dialect: Option<String>,

        /// Render relative time windows against this instant (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },

    /// Parse a capability document and print what it allows
    Capabilities {
        /// Capability document: file path or URL (http:// or https://)
        source: String,

        /// Output as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Check that a query expression is accepted by a source
    Check {
        /// Query expression file (JSON)
        query: PathBuf,

        /// Capability document: file path or URL (http:// or https://)
        #[arg(long, short)]
        capabilities: String,

        /// Source configuration file (mapping, axis order, dialect, unit)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .init();

    let result = match cli.command {
        Commands::Render {
            query,
            capabilities,
            config,
            dialect,
            now,
        } => run_render(&query, &capabilities, config.as_deref(), dialect, now),

        Commands::Capabilities { source, json } => run_capabilities(&source, json),

        Commands::Check {
            query,
            capabilities,
            config,
        } => run_check(&query, &capabilities, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Load config, capabilities and query, then build the predicate tree.
fn build_tree(
    query_path: &Path,
    capabilities_source: &str,
    config_path: Option<&Path>,
) -> Result<(SourceConfig, PredicateNode), u8> {
    let config = match config_path {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Error loading config: {}", e);
            e.exit_code() as u8
        })?,
        None => SourceConfig::default(),
    };

    let capabilities = load_capabilities(capabilities_source).map_err(|e| {
        eprintln!("Error loading capabilities: {}", e);
        e.exit_code() as u8
    })?;

    let document = load_document(query_path).map_err(|e| {
        eprintln!("Error loading query: {}", e);
        e.exit_code() as u8
    })?;
    let query = QueryExpr::from_value(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let node = config
        .builder(Arc::new(capabilities))
        .build(&query)
        .map_err(|e| {
            eprintln!("Query rejected: {}", e);
            e.exit_code() as u8
        })?;

    Ok((config, node))
}

fn run_render(
    query_path: &Path,
    capabilities_source: &str,
    config_path: Option<&Path>,
    dialect: Option<String>,
    now: Option<String>,
) -> Result<(), u8> {
    let (mut config, node) = build_tree(query_path, capabilities_source, config_path)?;

    if let Some(name) = dialect {
        config.dialect = DialectName::parse(&name).ok_or_else(|| {
            eprintln!("Error: unknown dialect \"{}\": expected standard or legacy", name);
            2u8
        })?;
    }

    let mut writer = config.writer();
    if let Some(now) = now {
        let instant = parse_date(&now).map_err(|e| {
            eprintln!("Error: --now: {}", e);
            2u8
        })?;
        writer = writer.with_clock(Arc::new(FixedClock(instant)));
    }

    println!("{}", writer.render(&node));
    Ok(())
}

fn run_check(
    query_path: &Path,
    capabilities_source: &str,
    config_path: Option<&Path>,
) -> Result<(), u8> {
    build_tree(query_path, capabilities_source, config_path)?;
    println!("OK");
    Ok(())
}

fn run_capabilities(source: &str, json_output: bool) -> Result<(), u8> {
    let capabilities = load_capabilities(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if json_output {
        let output = serde_json::to_string_pretty(&capabilities).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        print_capabilities(&capabilities);
    }
    Ok(())
}

fn print_capabilities(capabilities: &CapabilitySet) {
    let join = |names: Vec<String>| {
        if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        }
    };

    println!(
        "comparison: {}",
        join(capabilities.comparison_operators().map(|op| op.to_string()).collect())
    );
    println!(
        "spatial:    {}",
        join(capabilities.spatial_operators().map(|op| op.to_string()).collect())
    );
    println!(
        "geometry:   {}",
        join(capabilities.geometry_operands().map(|kind| kind.to_string()).collect())
    );
    println!(
        "logical:    {}",
        if capabilities.supports_logical() {
            "yes"
        } else {
            "no"
        }
    );
}
