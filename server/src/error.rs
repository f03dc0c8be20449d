//! Error types for the puzzle server and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use shared::{ErrorResponse, ValidateResponse};
use thiserror::Error;

/// Failures of the backing stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Session record could not be encoded or decoded
    #[error("Session codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Backend refused or lost the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Seed document is unusable
    #[error("Invalid seed: {0}")]
    Seed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a game operation can refuse with.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("No game in progress")]
    NoGameInProgress,

    /// Unknown character, or one that belongs to another image
    #[error("Invalid character")]
    InvalidCharacter,

    #[error("Invalid image")]
    InvalidImage,

    #[error("Game not complete")]
    GameNotComplete,

    #[error("{0}")]
    InvalidInput(String),

    /// The session kept changing underneath a click
    #[error("Session busy")]
    SessionContention,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::NoGameInProgress
            | GameError::InvalidCharacter
            | GameError::InvalidImage
            | GameError::GameNotComplete
            | GameError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GameError::SessionContention => StatusCode::CONFLICT,
            GameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, GameError::Store(_))
    }
}

/// Body layout of an error response. The click endpoint answers in the same
/// `{success, message}` form as its soft failures; everything else uses `{error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape {
    Validation,
    Plain,
}

/// A `GameError` ready to leave the process as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub error: GameError,
    pub shape: ErrorShape,
    /// Expose internal error text (development) instead of a generic message
    pub verbose: bool,
}

impl ApiError {
    pub fn new(error: GameError, shape: ErrorShape, verbose: bool) -> Self {
        Self {
            error,
            shape,
            verbose,
        }
    }

    pub fn public_message(&self) -> String {
        if self.error.is_internal() && !self.verbose {
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.is_internal() {
            error!("Server error: {}", self.error);
        }

        let status = self.error.status();
        let message = self.public_message();
        match self.shape {
            ErrorShape::Validation => {
                (status, Json(ValidateResponse::failure(message))).into_response()
            }
            ErrorShape::Plain => (status, Json(ErrorResponse { error: message })).into_response(),
        }
    }
}
