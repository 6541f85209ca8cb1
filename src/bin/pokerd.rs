use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pokerd::engine::nl::TableStakes;
use pokerd::{run_server, ServerConfig, TableConfig};

const LOG_TARGET: &str = "bin::pokerd";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Parser)]
#[command(name = "pokerd")]
#[command(about = "Real-time multi-room no-limit hold'em server", long_about = None)]
struct Args {
    /// Address to bind the WebSocket listener to (host:port)
    #[arg(long, env = "POKERD_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Starting chip stack for every seat
    #[arg(long, env = "POKERD_STARTING_STACK", default_value_t = 1000)]
    starting_stack: u64,

    /// Small blind
    #[arg(long, env = "POKERD_SMALL_BLIND", default_value_t = 10)]
    small_blind: u64,

    /// Big blind
    #[arg(long, env = "POKERD_BIG_BLIND", default_value_t = 20)]
    big_blind: u64,

    /// Maximum seats per room
    #[arg(long, env = "POKERD_MAX_SEATS", default_value_t = 6)]
    max_seats: usize,

    /// Seconds a seat gets to act before the auto-action fires
    #[arg(long, env = "POKERD_TURN_SECONDS", default_value_t = 30)]
    turn_seconds: u64,

    /// Pause between hands, in seconds
    #[arg(long, env = "POKERD_INTER_HAND_SECONDS", default_value_t = 6)]
    inter_hand_seconds: u64,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "POKERD_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json);
    let config = build_config(&args)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target = LOG_TARGET, "ctrl-c received, shutting down");
            shutdown.cancel();
        }
    });

    run_server(config, cancel).await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}

fn build_config(args: &Args) -> Result<ServerConfig> {
    if args.max_seats < 2 || args.max_seats > 6 {
        bail!("max seats must be between 2 and 6, got {}", args.max_seats);
    }
    if args.small_blind == 0 || args.big_blind == 0 {
        bail!("blinds must be non-zero");
    }
    if args.starting_stack < args.big_blind {
        bail!("starting stack must cover at least one big blind");
    }
    Ok(ServerConfig {
        bind: args.bind,
        table: TableConfig {
            starting_stack: args.starting_stack,
            stakes: TableStakes {
                small_blind: args.small_blind,
                big_blind: args.big_blind,
            },
            max_seats: args.max_seats,
            turn_timeout: Duration::from_secs(args.turn_seconds),
            inter_hand_delay: Duration::from_secs(args.inter_hand_seconds),
            runout_step: Duration::from_secs(1),
        },
    })
}
