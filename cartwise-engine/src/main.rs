//! cartwise-engine - Reference CLI for the Cartwise decision engine
//!
//! Reads a JSON decision request (ingredients + catalog snapshot + vendor
//! registry) from a file, runs the engine, and prints the decision set as
//! JSON on stdout. The engine itself performs no I/O; this binary is the
//! reference caller used by operators and integration harnesses.

use anyhow::{Context, Result};
use cartwise_common::config::load_config;
use cartwise_engine::engine::{DecisionEngine, DecisionRequest};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cartwise-engine", version, about = "Cartwise decision engine")]
struct Args {
    /// Path to the JSON decision request
    request: PathBuf,

    /// Path to an engine config TOML (falls back to CARTWISE_CONFIG, then
    /// the platform config directory, then compiled-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Include the decision trace in the output
    #[arg(long)]
    trace: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting Cartwise decision engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("loading engine configuration")?;
    let engine = DecisionEngine::new(config);

    let raw = std::fs::read_to_string(&args.request)
        .with_context(|| format!("reading request file {}", args.request.display()))?;
    let request: DecisionRequest =
        serde_json::from_str(&raw).context("parsing decision request")?;

    let decision = if args.trace {
        engine.decide_traced(request).await
    } else {
        engine.decide(request).await
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&decision)?
    } else {
        serde_json::to_string(&decision)?
    };
    println!("{output}");

    Ok(())
}
