//! Game rules applied against the session and puzzle stores
//!
//! `GameService` is the authoritative side of a play session:
//! - Starting (and restarting) a puzzle
//! - Click validation with duplicate and cross-image rejection
//! - Completion detection and server-side timing
//! - Score recording and high score queries
//!
//! Every method resolves the session by token on each call; nothing about a
//! player is cached between requests.

use crate::config::ScorePolicy;
use crate::error::GameError;
use crate::session::{token_tag, SessionRecord, SessionStore};
use crate::store::{NewHighScore, PuzzleStore};
use crate::utils::generate_session_token;
use log::{debug, error, info};
use shared::{
    normalize_player_name, Character, CharacterSummary, GamePhase, HighScore, ImageSummary,
    Position, PuzzleImage, PuzzleView, ScoresResponse, SessionGameState, ValidateResponse,
    HIGH_SCORE_LIMIT, MAX_NAME_LEN, MSG_ALREADY_FOUND, MSG_MISS, NO_LEVELS_LABEL,
};
use std::sync::Arc;

/// How many times a click is re-evaluated when its session keeps changing
/// between read and write.
const MAX_CLICK_ATTEMPTS: usize = 3;

/// Result of a click that was well-formed and aimed at the active puzzle
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Character found; more remain
    Hit { position: Position },
    /// Last character found
    Completed { position: Position, elapsed: f64 },
    Miss,
    AlreadyFound,
}

impl From<ClickOutcome> for ValidateResponse {
    fn from(outcome: ClickOutcome) -> Self {
        match outcome {
            ClickOutcome::Hit { position } => ValidateResponse::hit(position),
            ClickOutcome::Completed { position, elapsed } => {
                ValidateResponse::completed(position, elapsed)
            }
            ClickOutcome::Miss => ValidateResponse::failure(MSG_MISS),
            ClickOutcome::AlreadyFound => ValidateResponse::failure(MSG_ALREADY_FOUND),
        }
    }
}

pub struct GameService {
    puzzles: Arc<dyn PuzzleStore>,
    sessions: Arc<dyn SessionStore>,
    score_policy: ScorePolicy,
}

impl GameService {
    pub fn new(
        puzzles: Arc<dyn PuzzleStore>,
        sessions: Arc<dyn SessionStore>,
        score_policy: ScorePolicy,
    ) -> Self {
        Self {
            puzzles,
            sessions,
            score_policy,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Resolves the presented token to a live session, creating a fresh one
    /// under a new token when it is missing, unknown or expired.
    ///
    /// Returns the token to use and whether it was newly issued.
    pub async fn ensure_session(
        &self,
        token: Option<&str>,
        now: u64,
    ) -> Result<(String, bool), GameError> {
        if let Some(token) = token {
            if self.sessions.load(token).await?.is_some() {
                return Ok((token.to_string(), false));
            }
        }

        let token = generate_session_token();
        self.sessions
            .save(&token, &SessionGameState::new(now))
            .await?;
        info!("Session {} created", token_tag(&token));
        Ok((token, true))
    }

    /// Starts `image_id` for the session, discarding any earlier progress.
    pub async fn start_puzzle(
        &self,
        token: &str,
        image_id: u32,
        now: u64,
    ) -> Result<PuzzleImage, GameError> {
        let image = self
            .puzzles
            .find_image(image_id)
            .await?
            .ok_or(GameError::InvalidImage)?;

        self.sessions
            .save(token, &SessionGameState::started(image.id, now))
            .await?;
        info!("Session {} started '{}'", token_tag(token), image.name);
        Ok(image)
    }

    async fn active_record(&self, token: &str) -> Result<(SessionRecord, u32), GameError> {
        let record = self
            .sessions
            .load(token)
            .await?
            .ok_or(GameError::NoGameInProgress)?;
        let image_id = record
            .state
            .active_image()
            .ok_or(GameError::NoGameInProgress)?;
        Ok((record, image_id))
    }

    /// Checks a click against `character_id` and records a find.
    ///
    /// The found-set update is a compare-and-set on the session revision. When
    /// another request wrote the session in between, the click is evaluated
    /// again against the fresh record, so two concurrent clicks on the same
    /// character yield one hit and one `AlreadyFound`.
    pub async fn validate_click(
        &self,
        token: &str,
        click: Position,
        character_id: u32,
        now: u64,
    ) -> Result<ClickOutcome, GameError> {
        if !click.is_normalized() {
            return Err(GameError::invalid_input(
                "Click coordinates must be between 0 and 1",
            ));
        }

        for attempt in 1..=MAX_CLICK_ATTEMPTS {
            let (record, image_id) = self.active_record(token).await?;

            if record.state.has_found(character_id) {
                return Ok(ClickOutcome::AlreadyFound);
            }

            let character = self
                .puzzles
                .find_character(character_id)
                .await?
                .filter(|character| character.image_id == image_id)
                .ok_or(GameError::InvalidCharacter)?;

            if !character.is_hit_by(&click) {
                return Ok(ClickOutcome::Miss);
            }

            let mut next = record.state.clone();
            next.mark_found(character.id);
            let total = self.puzzles.count_characters(image_id).await?;

            if !self
                .sessions
                .compare_and_swap(token, record.revision, &next)
                .await?
            {
                debug!(
                    "Session {} changed during click (attempt {}), re-evaluating",
                    token_tag(token),
                    attempt
                );
                continue;
            }

            let position = character.position();
            if next.phase(total) == GamePhase::Completed {
                let elapsed = next.elapsed_seconds(now);
                info!(
                    "Session {} found all {} characters in {:.3}s",
                    token_tag(token),
                    total,
                    elapsed
                );
                return Ok(ClickOutcome::Completed { position, elapsed });
            }
            return Ok(ClickOutcome::Hit { position });
        }

        Err(GameError::SessionContention)
    }

    /// Saves a high score for the active puzzle and ends the session.
    ///
    /// The time is always measured here, from the session's start to `now`.
    pub async fn record_score(
        &self,
        token: &str,
        raw_name: &str,
        now: u64,
    ) -> Result<HighScore, GameError> {
        let (record, image_id) = self.active_record(token).await?;

        let name = normalize_player_name(raw_name).ok_or_else(|| {
            GameError::invalid_input(format!(
                "Name must be between 1 and {} characters",
                MAX_NAME_LEN
            ))
        })?;

        if self.score_policy == ScorePolicy::RequireCompletion {
            let total = self.puzzles.count_characters(image_id).await?;
            if record.state.phase(total) != GamePhase::Completed {
                return Err(GameError::GameNotComplete);
            }
        }

        let time = record.state.elapsed_seconds(now);

        // Removing first makes a double submission lose the race instead of
        // writing a second row.
        if !self.sessions.remove_if(token, record.revision).await? {
            return match self.sessions.load(token).await? {
                Some(current) if current.state.active_image().is_some() => {
                    Err(GameError::SessionContention)
                }
                _ => Err(GameError::NoGameInProgress),
            };
        }

        let insert = self
            .puzzles
            .insert_high_score(NewHighScore {
                name: name.clone(),
                time,
                image_id,
                created_at: now,
            })
            .await;
        let score = match insert {
            Ok(score) => score,
            Err(err) => {
                error!(
                    "Failed to record score {:.3}s for '{}' on image {}: {}",
                    time, name, image_id, err
                );
                // Restore the run the failed score belonged to.
                if let Err(restore) = self.sessions.save(token, &record.state).await {
                    error!(
                        "Session {} could not be restored: {}",
                        token_tag(token),
                        restore
                    );
                }
                return Err(err.into());
            }
        };
        info!(
            "Recorded score {:.3}s for '{}' on image {}",
            score.time, score.name, image_id
        );
        Ok(score)
    }

    /// Top scores for the requested image, else the session's image, else the
    /// first image.
    pub async fn list_scores(
        &self,
        token: &str,
        requested: Option<u32>,
    ) -> Result<ScoresResponse, GameError> {
        let image = match requested {
            Some(image_id) => Some(
                self.puzzles
                    .find_image(image_id)
                    .await?
                    .ok_or(GameError::InvalidImage)?,
            ),
            None => {
                let session_image = match self.sessions.load(token).await? {
                    Some(record) => match record.state.active_image() {
                        Some(image_id) => self.puzzles.find_image(image_id).await?,
                        None => None,
                    },
                    None => None,
                };
                match session_image {
                    Some(image) => Some(image),
                    None => self.puzzles.first_image().await?,
                }
            }
        };

        match image {
            Some(image) => Ok(ScoresResponse {
                scores: self.puzzles.top_scores(image.id, HIGH_SCORE_LIMIT).await?,
                image_name: image.name,
            }),
            None => Ok(ScoresResponse {
                scores: Vec::new(),
                image_name: NO_LEVELS_LABEL.to_string(),
            }),
        }
    }

    /// The active puzzle without character positions, or `None` when the
    /// session has not started one.
    pub async fn current_puzzle(
        &self,
        token: &str,
        now: u64,
    ) -> Result<Option<PuzzleView>, GameError> {
        let record = match self.sessions.load(token).await? {
            Some(record) => record,
            None => return Ok(None),
        };
        let image = match record.state.active_image() {
            Some(image_id) => self.puzzles.find_image(image_id).await?,
            None => None,
        };
        let image = match image {
            Some(image) => image,
            None => return Ok(None),
        };

        let characters = self.puzzles.characters_for_image(image.id).await?;
        Ok(Some(PuzzleView {
            image_id: image.id,
            image_name: image.name,
            image_url: image.url,
            characters: characters.iter().map(CharacterSummary::from).collect(),
            found: record.state.found.iter().copied().collect(),
            elapsed: record.state.elapsed_seconds(now),
        }))
    }

    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, GameError> {
        Ok(self
            .puzzles
            .list_images()
            .await?
            .into_iter()
            .map(|image| ImageSummary {
                id: image.id,
                name: image.name,
            })
            .collect())
    }

    /// Characters of the active image with their positions. Empty without a game.
    pub async fn debug_characters(&self, token: &str) -> Result<Vec<Character>, GameError> {
        let image_id = match self.sessions.load(token).await? {
            Some(record) => record.state.active_image(),
            None => None,
        };
        match image_id {
            Some(image_id) => Ok(self.puzzles.characters_for_image(image_id).await?),
            None => Ok(Vec::new()),
        }
    }
}
