//! rpc-pool: operator CLI around the connection pool.
//!
//! Builds a pool from a TOML file and/or flags, then acquires connections,
//! prints endpoint state, or watches health until interrupted.

use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, Subcommand};

use rpc_pool::config::loader::read_config;
use rpc_pool::lifecycle::signals::wait_for_signal;
use rpc_pool::observability::logging::init_logging;
use rpc_pool::{EndpointStatus, HttpConnector, Pool, PoolConfig, PoolMode, Shutdown};

#[derive(Parser)]
#[command(name = "rpc-pool")]
#[command(about = "Round-robin connection pool for backend endpoints", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend address (host:port). Repeat for several; replaces the file's list.
    #[arg(short, long = "address")]
    addresses: Vec<String>,

    /// Acquisition policy (eager or lazy).
    #[arg(short, long)]
    mode: Option<PoolMode>,

    /// Log level, unless RUST_LOG is set.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire connections in rotation and report where each came from
    Acquire {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Pause between acquisitions in milliseconds.
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
    /// Print endpoint state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Print endpoint state every probe interval until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => PoolConfig::default(),
    };
    if !cli.addresses.is_empty() {
        config.addresses = cli.addresses.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    init_logging(&config.observability)?;

    tracing::info!(
        mode = %config.mode,
        endpoints = config.addresses.len(),
        dial_timeout_ms = config.dial.timeout_ms,
        max_retries = config.dial.max_retries,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let connector = HttpConnector::new(config.transport.clone());
    let interval = config.health_check.interval();
    let pool = Pool::with_shutdown(config, connector, shutdown.subscribe()).await?;

    let outcome = match cli.command {
        Commands::Acquire { count, delay_ms } => acquire(&pool, count, delay_ms).await,
        Commands::Status { json } => {
            print_status(&pool.snapshot().await, json)?;
            Ok(())
        }
        Commands::Watch => watch(&pool, &shutdown, interval).await,
    };

    pool.close().await?;
    tracing::info!("Shutdown complete");
    outcome
}

async fn acquire(
    pool: &Pool<HttpConnector>,
    count: usize,
    delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    for i in 0..count {
        let conn = pool.get_conn().await?;
        println!("{:>4}  {}", i + 1, conn.address());
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
    Ok(())
}

async fn watch(
    pool: &Pool<HttpConnector>,
    shutdown: &Shutdown,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(interval);
    let signal = wait_for_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                print_status(&pool.snapshot().await, false)?;
                println!();
            }
            res = &mut signal => {
                shutdown.trigger();
                return Ok(res?);
            }
        }
    }
}

fn print_status(endpoints: &[EndpointStatus], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(endpoints)?);
        return Ok(());
    }

    println!("{:<32} {:<10} {:<10} {}", "ADDRESS", "HEALTH", "CONNECTED", "LAST CHECK");
    for ep in endpoints {
        let last = ep
            .last_checked_ms_ago
            .map(|ms| format!("{}ms ago", ms))
            .unwrap_or_else(|| "never".to_string());
        println!("{:<32} {:<10} {:<10} {}", ep.address, ep.health.to_string(), ep.connected, last);
    }
    Ok(())
}
