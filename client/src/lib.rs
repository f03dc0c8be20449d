//! # Puzzle Client Library
//!
//! This library provides a terminal player for the hidden character puzzle
//! server. It talks to the server over HTTP, keeps a display-only copy of
//! the current attempt and renders it as text.
//!
//! ## Architecture Overview
//!
//! The server is authoritative for everything that matters: whether a click
//! hits, which characters are found and how long the run took. The client
//! never predicts any of it. It only sends clicks and draws what comes back.
//!
//! ### Session Continuity
//! The server identifies players by a session cookie. `GameClient` keeps a
//! cookie store, so every request from one client belongs to one session.
//!
//! ### Display Clock
//! The running clock starts from the elapsed time the server reports when a
//! puzzle is loaded and advances locally. On completion it is replaced by
//! the server's measured time.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Local display state: found characters, markers at the positions the
//! server reported, and the display clock.
//!
//! ### Input Module (`input`)
//! Parsing of terminal command lines such as `click 0.45 0.6 1`.
//!
//! ### Network Module (`network`)
//! `GameClient`, one method per server route.
//!
//! ### Rendering Module (`rendering`)
//! Text output: status line, character grid board and score tables.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientGameState;
//! use client::network::GameClient;
//! use std::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GameClient::new("http://127.0.0.1:3000")?;
//!     let mut state = ClientGameState::new();
//!
//!     client.start(1).await?;
//!     if let Some(view) = client.puzzle().await? {
//!         state.load_puzzle(view, Instant::now());
//!     }
//!
//!     let response = client.validate(shared::Position::new(0.46, 0.61), 1).await?;
//!     state.apply_validation(1, &response);
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
