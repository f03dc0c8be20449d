//! # Puzzle Server Library
//!
//! This library provides the authoritative server for the hidden character
//! puzzle game. Players pick a puzzle image, click where they believe each
//! character hides, and race the clock. The server owns every judgement:
//! hit testing, progress tracking, timing and the high score table.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Validation
//! Clients only report where they clicked. Character coordinates never leave
//! the server outside of the development debug route, and a hit is decided
//! against a square tolerance box around the stored position.
//!
//! ### Session Management
//! Each browser or terminal client is identified by an opaque cookie token.
//! The token maps to a serialized game record in the session store, which
//! expires idle sessions and supports compare-and-set writes so concurrent
//! clicks on one session never lose a found character.
//!
//! ### Scoring
//! Completion time is measured on the server from the start timestamp kept
//! in the session. Recording a score consumes the session's game so the
//! same run cannot be submitted twice.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The rules of play, independent of HTTP:
//! - Starting and restarting a puzzle
//! - Click validation and completion detection
//! - Score recording and leaderboard resolution
//!
//! ### Session Module (`session`)
//! The session store abstraction and its in-memory implementation with
//! idle expiry and revision-checked writes.
//!
//! ### Store Module (`store`)
//! Puzzle content (images and characters) seeded at startup, plus the
//! append-only high score table.
//!
//! ### Network Module (`network`)
//! Router construction, the session cookie middleware, request logging and
//! the expired-session sweeper task.
//!
//! ### Routes Module (`routes`)
//! Thin request handlers that decode bodies and delegate to the game module.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use server::session::MemorySessionStore;
//! use server::store::{MemoryPuzzleStore, Seed};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let puzzles = Arc::new(MemoryPuzzleStore::from_seed(Seed::default())?);
//!     let sessions = Arc::new(MemorySessionStore::new(config.session_ttl()));
//!
//!     // Serves until the listener fails; expired sessions are swept
//!     // in the background while it runs
//!     let server = Server::new(config, puzzles, sessions).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Deployment Modes
//!
//! ### Development
//! Every request is logged, internal error messages are returned to the
//! caller and `/debug/characters` reveals the active puzzle's answers.
//!
//! ### Production
//! Internal failures are reported as a generic message, the debug route is
//! not mounted and session cookies carry the `Secure` attribute.

pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod routes;
pub mod session;
pub mod store;
pub mod utils;
