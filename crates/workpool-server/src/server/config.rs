use anyhow::{Context, bail};
use axum::http::HeaderValue;
use clap::Parser;
use core::time::Duration;
use tracing::level_filters::LevelFilter;
use workpool::PoolConfig;

/// Runtime configuration for the `workpool-server` binary.
///
/// All values are parsed from CLI arguments or environment variables, with
/// defaults suitable for local development against the dashboard.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "workpool-server",
    version,
    about = "An HTTP control plane for a resizable worker pool"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Number of workers spawned at startup. May be zero; workers can be
    /// added later through the API.
    ///
    /// Environment variable: `INITIAL_WORKERS`
    #[arg(long, env = "INITIAL_WORKERS", default_value_t = workpool::DEFAULT_INITIAL_WORKERS)]
    pub initial_workers: usize,

    /// Capacity of the input queue. Messages sent while it is full are
    /// dropped.
    ///
    /// Environment variable: `QUEUE_SIZE`
    #[arg(long, env = "QUEUE_SIZE", default_value_t = workpool::DEFAULT_QUEUE_CAPACITY)]
    pub queue_size: usize,

    /// Simulated processing time per message, in milliseconds.
    ///
    /// Environment variable: `PROCESS_DELAY_MS`
    #[arg(long, env = "PROCESS_DELAY_MS", default_value_t = 500)]
    pub process_delay_ms: u64,

    /// Seconds to wait for workers to exit on shutdown before the input
    /// queue is force-closed.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// Log verbosity: `trace`, `debug`, `info`, `warn` or `error`. Unknown
    /// values fall back to `info`. `RUST_LOG` overrides this when set.
    ///
    /// Environment variable: `LOG_LEVEL`
    #[arg(long, env = "LOG_LEVEL", default_value_t = String::from("info"))]
    pub log_level: String,

    /// Origin allowed to call the API from a browser.
    ///
    /// Environment variable: `CORS_ORIGIN`
    #[arg(long, env = "CORS_ORIGIN", default_value_t = String::from("http://localhost:3000"))]
    pub cors_origin: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub pool: PoolConfig,
    pub shutdown_timeout: Duration,
    pub log_level: LevelFilter,
    pub cors_origin: HeaderValue,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.queue_size == 0 {
            bail!("QUEUE_SIZE must be greater than 0");
        }

        let cors_origin = HeaderValue::from_str(&args.cors_origin).with_context(|| {
            format!(
                "CORS_ORIGIN ({}) is not a valid header value",
                args.cors_origin
            )
        })?;

        Ok(Self {
            server_addr: args.server_addr,
            pool: PoolConfig {
                initial_workers: args.initial_workers,
                queue_capacity: args.queue_size,
                process_delay: Duration::from_millis(args.process_delay_ms),
            },
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            log_level: parse_log_level(&args.log_level),
            cors_origin,
        })
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}
