//! Rakhwala route server binary.
//!
//! # Usage
//!
//! ```bash
//! TOMTOM_API_KEY=... rakhwala-server --bind 0.0.0.0:8080
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use rakhwala_client::SystemEnv;
use rakhwala_server::{DEFAULT_UPSTREAM_URL, RandomPlaces, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rakhwala safe-route server
#[derive(Parser, Debug)]
#[command(name = "rakhwala-server")]
#[command(about = "Safety-ranked route API")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Routing provider API root
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL)]
    upstream: String,

    /// Routing provider API key
    #[arg(long, env = "TOMTOM_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Alternatives requested from the provider
    #[arg(long, default_value = "2")]
    max_alternatives: u32,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "10")]
    upstream_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Rakhwala route server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        upstream_url: args.upstream,
        api_key: args.api_key,
        max_alternatives: args.max_alternatives,
        upstream_timeout: Duration::from_secs(args.upstream_timeout),
    };

    let places = Arc::new(RandomPlaces::new(SystemEnv::new()));
    let server = Server::bind(config, places).await?;

    server.run().await?;

    Ok(())
}
