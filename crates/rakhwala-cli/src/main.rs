//! Rakhwala desktop companion.
//!
//! # Usage
//!
//! ```bash
//! rakhwala code --state ~/.rakhwala.redb
//! rakhwala track 482913 --db https://<project>.firebaseio.com
//! rakhwala routes --from 18.52,73.85 --to 18.56,73.91
//! ```

use std::{io::Write, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use rakhwala_client::{DEFAULT_BASE_URL, FirebaseConfig, FirebaseStore, HttpRouteSource, RouteClientConfig, SystemEnv};
use rakhwala_core::{RedbLocalStore, route::DEFAULT_REFERRER};
use rakhwala_proto::{AccessCode, RouteQuery};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rakhwala desktop companion
#[derive(Parser, Debug)]
#[command(name = "rakhwala")]
#[command(about = "Access codes, live tracking and safe routes from the terminal")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print this device's access code, creating it on first use
    Code {
        /// Local state file
        #[arg(long, default_value = "rakhwala.redb")]
        state: PathBuf,
    },

    /// Follow a location shared under an access code
    Track {
        /// Six digit access code
        code: String,

        /// Realtime database URL
        #[arg(long, env = "RAKHWALA_DB_URL")]
        db: String,

        /// Database auth token
        #[arg(long, env = "RAKHWALA_DB_AUTH", hide_env_values = true)]
        auth: Option<String>,

        /// Seconds between polls
        #[arg(long, default_value = "2")]
        poll_secs: u64,
    },

    /// Query safety-ranked routes
    Routes {
        /// Start as lat,lon
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        /// Destination as lat,lon
        #[arg(long, allow_hyphen_values = true)]
        to: String,

        /// Route API root
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        api: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let mut stdout = std::io::stdout().lock();

    match args.command {
        Command::Code { state } => {
            let storage = RedbLocalStore::open(&state)?;
            let code = rakhwala_cli::access_code(storage, &SystemEnv::new())?;
            writeln!(stdout, "{code}")?;
        },
        Command::Track { code, db, auth, poll_secs } => {
            let code: AccessCode = code.parse()?;
            let mut config = FirebaseConfig::new(db);
            config.auth = auth;
            config.poll_interval = Duration::from_secs(poll_secs.max(1));
            let store = FirebaseStore::new(&config)?;

            tracing::info!(%code, "tracking");
            tokio::select! {
                result = rakhwala_cli::track(&store, code, &mut stdout, None) => result?,
                _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
            }
        },
        Command::Routes { from, to, api } => {
            let query = RouteQuery {
                start: rakhwala_cli::parse_coordinate(&from)?,
                end: rakhwala_cli::parse_coordinate(&to)?,
            };
            let source = HttpRouteSource::new(&RouteClientConfig { base_url: api, ..Default::default() })?;
            rakhwala_cli::routes(&source, query, DEFAULT_REFERRER, &mut stdout).await?;
        },
    }

    Ok(())
}
