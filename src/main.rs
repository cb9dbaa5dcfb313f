//! # SubClock — webhook clock service
//!
//! Clients register a callback URL and a frequency; SubClock POSTs the
//! current time to that URL on every tick until the client deregisters.
//!
//! Usage:
//!   subclock                           # Serve on the configured address (default 0.0.0.0:5000)
//!   subclock --port 8080               # Custom port
//!   subclock --config ./subclock.toml  # Explicit config file

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use subclock_core::SubClockConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "subclock",
    version,
    about = "⏰ SubClock — calls your webhook on a schedule"
)]
struct Cli {
    /// Config file (default: ~/.subclock/config.toml, or $SUBCLOCK_CONFIG)
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Per-call notifier timeout in seconds, overrides the config file
    #[arg(long)]
    notify_timeout_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        "subclock=debug,subclock_gateway=debug,subclock_scheduler=debug,tower_http=debug"
    } else {
        "subclock=info,subclock_gateway=info,subclock_scheduler=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<SubClockConfig> {
    let explicit = cli
        .config
        .clone()
        .or_else(|| std::env::var("SUBCLOCK_CONFIG").ok());

    let mut config = match explicit {
        Some(path) => {
            let path = expand_path(&path);
            tracing::info!("📄 Loading config from {}", path.display());
            SubClockConfig::load_from(&path)?
        }
        None => SubClockConfig::load()?,
    };

    if let Some(host) = &cli.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(secs) = cli.notify_timeout_secs {
        config.notifier.timeout_secs = Some(secs);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = load_config(&cli)?;
    tracing::info!(
        "⏰ SubClock v{} (frequency {}s..={}s)",
        env!("CARGO_PKG_VERSION"),
        config.limits.min_interval_secs,
        config.limits.max_interval_secs
    );

    subclock_gateway::start(&config).await
}
