//! Casino War table server.
//!
//! Spawns a single authoritative TableActor and serves the game protocol
//! to every connected client over one WebSocket endpoint.

mod api;
mod config;

use std::net::SocketAddr;

use anyhow::Error;
use casino_war::TableActor;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

use crate::config::ServerConfig;

const HELP: &str = "\
Run a Casino War table server

USAGE:
  cw_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6789]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:6789)
  TABLE_NAME               Table display name
  TABLE_NUMBER             Table number shown to clients
  TABLE_MAX_SEATS          Number of seats at the table
  TABLE_MIN_BET            Minimum bet shown to clients
  TABLE_MAX_BET            Maximum bet shown to clients
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override)?;
    config.validate()?;

    info!("Starting Casino War server at {}", config.bind);
    info!(
        "Table '{}' (#{}) with {} seats, bets {}-{}",
        config.table.name,
        config.table.settings.table_number,
        config.table.settings.max_seats,
        config.table.settings.min_bet,
        config.table.settings.max_bet
    );

    let (actor, handle) = TableActor::new(config.table.clone());
    tokio::spawn(actor.run());

    let state = api::AppState::new(handle);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
