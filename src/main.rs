//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                LOAD BALANCER                 │
//!   Client Request       │  ┌────────┐    ┌────────────┐    ┌────────┐  │
//!   ─────────────────────┼─▶│  http  │───▶│ dispatcher │───▶│ client │──┼──▶ Backend
//!                        │  │ server │    │ (rr + 503) │    │        │  │
//!   Client Response      │  └────────┘    └─────┬──────┘    └────────┘  │
//!   ◀────────────────────┼── relay / 500        │ reads                 │
//!                        │                ┌─────▼──────┐    ┌────────┐  │
//!                        │                │  health    │◀───│ health │──┼──▶ Probe
//!                        │                │  registry  │    │monitor │  │
//!                        │                └────────────┘    └────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use lb_proxy::config::loader::read_config;
use lb_proxy::config::ProxyConfig;
use lb_proxy::lifecycle::startup;
use lb_proxy::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "lb-proxy", version)]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base address; repeat to build the pool. Replaces configured backends.
    #[arg(long = "backend", value_name = "URL")]
    backends: Vec<String>,

    /// Log level, overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if !cli.backends.is_empty() {
        config = config.with_backends(cli.backends);
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lb-proxy starting");

    startup::run(config).await?;
    Ok(())
}
