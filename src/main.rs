//! Storage Distribution CLI
//!
//! Loads a decision matrix and a distribution request, resolves them and
//! prints the resulting drive layout or the structured error.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cloud_storage_distribution::{
    document, CloudResourceInfo, DocumentFormat, InstanceInfo, MemoryOps, PoolProvisioner,
    RankPolicy, Resolver, ResolverConfig, TieBreak,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Distribution - resolve capacity requirements into cloud drive layouts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// Decision matrix document (.yaml, .yml or .json)
    #[arg(long, env = "DISTRIBUTION_MATRIX")]
    matrix: PathBuf,

    /// Distribution request document (.yaml, .yml or .json)
    #[arg(long, env = "DISTRIBUTION_REQUEST")]
    request: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    output: DocumentFormat,

    /// Tie-break rules applied after priority, in order
    #[arg(long = "tie-break", value_name = "RULE")]
    tie_breaks: Vec<TieBreak>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a request against a decision matrix
    Resolve(ResolveArgs),

    /// Resolve, then lay the drives out on an in-memory driver
    DryRun {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Set identifier prefix for the created pools
        #[arg(long)]
        set_prefix: Option<String>,
    },

    /// Print the JSON Schema of a document type
    Schema {
        #[arg(value_enum)]
        document: SchemaKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SchemaKind {
    Matrix,
    Request,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    if let Err(e) = run(args.command).await {
        match e.downcast_ref::<cloud_storage_distribution::Error>() {
            Some(err) => eprintln!("error[{}]: {:#}", err.kind(), e),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Resolve(args) => {
            let (response, _) = resolve(&args)?;
            println!("{}", document::render_response(&response, args.output)?);
        }
        Command::DryRun { resolve: args, set_prefix } => {
            let (response, region) = resolve(&args)?;

            let ops = Arc::new(MemoryOps::new(InstanceInfo {
                resource: CloudResourceInfo {
                    name: "dry-run".to_string(),
                    id: "dry-run-0".to_string(),
                    region: region.unwrap_or_default(),
                    ..Default::default()
                },
            }));

            let mut provisioner = PoolProvisioner::new(ops);
            if let Some(prefix) = set_prefix {
                provisioner = provisioner.with_set_prefix(prefix);
            }

            let pools = provisioner.provision(&response).await?;
            for pool in &pools {
                println!(
                    "pool {} [{}]: {} x {} GiB {}",
                    pool.index,
                    pool.set_identifier,
                    pool.pool.drive_count,
                    pool.pool.drive_capacity,
                    pool.pool.drive_type
                );
                for volume in &pool.volumes {
                    println!(
                        "  {} -> {}",
                        volume.id,
                        volume.device_path.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Command::Schema { document: kind } => {
            let schema = match kind {
                SchemaKind::Matrix => document::matrix_schema(),
                SchemaKind::Request => document::request_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn resolve(
    args: &ResolveArgs,
) -> anyhow::Result<(cloud_storage_distribution::DistributionResponse, Option<String>)> {
    let matrix = document::load_matrix(&args.matrix)
        .with_context(|| format!("loading decision matrix {}", args.matrix.display()))?;
    let request = document::load_request(&args.request)
        .with_context(|| format!("loading request {}", args.request.display()))?;

    let mut config = ResolverConfig::default();
    if !args.tie_breaks.is_empty() {
        config.rank_policy = RankPolicy::new(args.tie_breaks.clone());
    }

    info!(
        "Resolving {} against {} rows",
        args.request.display(),
        matrix.len()
    );

    let response = Resolver::new(config).resolve(&request, &matrix)?;
    Ok((response, request.region))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
