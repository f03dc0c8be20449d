//! Puzzle model and session rules shared by the server and the terminal client.
//!
//! Everything in here is pure: no I/O and no clock reads. Timestamps are passed
//! in as epoch milliseconds so that the same rules can be exercised from tests,
//! the server and the client without disagreement.

pub mod protocol;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use protocol::*;

/// Per-axis distance a click may be away from a target and still count as a hit.
pub const TOLERANCE: f64 = 0.05;
/// Number of rows returned by a high score listing.
pub const HIGH_SCORE_LIMIT: usize = 10;
/// Longest accepted player name, in characters, after trimming.
pub const MAX_NAME_LEN: usize = 32;
/// Label returned in place of an image name when no puzzle exists at all.
pub const NO_LEVELS_LABEL: &str = "No levels available";

/// A point in image space, both axes normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite and inside the unit square.
    pub fn is_normalized(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }

    /// Square hit box: each axis is checked independently against `tolerance`.
    ///
    /// This is not a radius check. A click near a corner of the box is accepted
    /// even though its Euclidean distance exceeds `tolerance`.
    pub fn within_tolerance(&self, target: &Position, tolerance: f64) -> bool {
        (self.x - target.x).abs() <= tolerance && (self.y - target.y).abs() <= tolerance
    }
}

/// A background picture with hidden characters in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleImage {
    pub id: u32,
    pub name: String,
    pub url: String,
}

/// A findable target with a fixed position inside exactly one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub image_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Character {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn is_hit_by(&self, click: &Position) -> bool {
        click.within_tolerance(&self.position(), TOLERANCE)
    }
}

/// A completed (or at least submitted) attempt. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScore {
    pub id: u32,
    pub name: String,
    /// Elapsed seconds between puzzle start and submission.
    pub time: f64,
    pub image_id: u32,
    /// Epoch milliseconds.
    pub created_at: u64,
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    NoGame,
    InProgress,
    Completed,
}

/// Ephemeral per-player record of an attempt.
///
/// Lives in the session store, keyed by the session token. The found set only
/// ever holds characters of `image_id`: starting a puzzle clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionGameState {
    /// Epoch milliseconds of the last puzzle start (or session creation).
    pub start_time: u64,
    pub found: BTreeSet<u32>,
    pub image_id: Option<u32>,
}

impl SessionGameState {
    /// A fresh session with no puzzle selected.
    pub fn new(now: u64) -> Self {
        Self {
            start_time: now,
            found: BTreeSet::new(),
            image_id: None,
        }
    }

    /// A session that has just started `image_id`.
    pub fn started(image_id: u32, now: u64) -> Self {
        let mut state = Self::new(now);
        state.start(image_id, now);
        state
    }

    /// Starts (or restarts) a puzzle. Any previous progress is dropped.
    pub fn start(&mut self, image_id: u32, now: u64) {
        self.start_time = now;
        self.found.clear();
        self.image_id = Some(image_id);
    }

    pub fn active_image(&self) -> Option<u32> {
        self.image_id
    }

    pub fn has_found(&self, character_id: u32) -> bool {
        self.found.contains(&character_id)
    }

    /// Records a find. Returns false when the character was already recorded.
    pub fn mark_found(&mut self, character_id: u32) -> bool {
        self.found.insert(character_id)
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    /// True once every one of `total_characters` targets has been found.
    pub fn is_complete(&self, total_characters: usize) -> bool {
        self.image_id.is_some() && total_characters > 0 && self.found.len() == total_characters
    }

    pub fn phase(&self, total_characters: usize) -> GamePhase {
        if self.image_id.is_none() {
            GamePhase::NoGame
        } else if self.is_complete(total_characters) {
            GamePhase::Completed
        } else {
            GamePhase::InProgress
        }
    }

    pub fn elapsed_seconds(&self, now: u64) -> f64 {
        elapsed_seconds(self.start_time, now)
    }
}

/// Seconds between two epoch-millisecond timestamps. Clock skew never yields
/// a negative duration.
pub fn elapsed_seconds(start: u64, end: u64) -> f64 {
    end.saturating_sub(start) as f64 / 1000.0
}

/// Trims a submitted player name and checks it is usable.
pub fn normalize_player_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return None;
    }
    Some(name.to_string())
}
