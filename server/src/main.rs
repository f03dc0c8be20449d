use clap::Parser;
use env_logger::Env;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use server::session::MemorySessionStore;
use server::store::{MemoryPuzzleStore, Seed};
use std::sync::Arc;

/// Main-method of the application.
/// Parses configuration, seeds the puzzle store and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    // RUST_LOG takes precedence over the mode's default level
    env_logger::Builder::from_env(Env::default().default_filter_or(config.default_log_filter()))
        .init();

    let seed = match &config.seed {
        Some(path) => {
            info!("Loading puzzles from {}", path.display());
            Seed::load(path).await?
        }
        None => Seed::default(),
    };

    let puzzles = Arc::new(MemoryPuzzleStore::from_seed(seed)?);
    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl()));
    let server = Server::new(config, puzzles, sessions).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
