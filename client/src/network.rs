//! HTTP access to the puzzle server. The session cookie is kept by the
//! underlying reqwest cookie store, so one `GameClient` is one player.

use log::debug;
use reqwest::redirect::Policy;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    Character, ErrorResponse, ImageSummary, Position, PuzzleView, SaveScoreRequest,
    ScoresResponse, StartRequest, ValidateRequest, ValidateResponse,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("unexpected response ({0})")]
    Unexpected(StatusCode),
}

impl ClientError {
    /// Message the server attached to a rejection, if this is one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Extracts the human readable message from either error body shape
pub fn error_message(body: &str) -> String {
    if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
        return error.error;
    }
    if let Ok(ValidateResponse {
        message: Some(message),
        ..
    }) = serde_json::from_str::<ValidateResponse>(body)
    {
        return message;
    }
    body.trim().to_string()
}

pub struct GameClient {
    http: reqwest::Client,
    base_url: String,
}

impl GameClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Redirects are inspected rather than followed: a redirect from `/`
        // means no game is in progress.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn rejection(response: Response) -> ClientError {
        let status = response.status();
        match response.text().await {
            Ok(body) => ClientError::Rejected {
                status,
                message: error_message(&body),
            },
            Err(e) => ClientError::Http(e),
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self.http.get(self.url("/health")).send().await?;
        Ok(response.status().is_success())
    }

    pub async fn images(&self) -> Result<Vec<ImageSummary>, ClientError> {
        let response = self.http.get(self.url("/images")).send().await?;
        Self::json(response).await
    }

    /// Starts (or restarts) a puzzle for this session
    pub async fn start(&self, image_id: u32) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/start"))
            .json(&StartRequest { image_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() || status.is_success() {
            debug!("Started image {}", image_id);
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// The active puzzle, or `None` when the server sends us to the image list
    pub async fn puzzle(&self) -> Result<Option<PuzzleView>, ClientError> {
        let response = self.http.get(self.url("/")).send().await?;
        let status = response.status();
        if status.is_redirection() {
            Ok(None)
        } else if status.is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// Submits a click. Misses and repeated finds come back as `Ok` with
    /// `success: false`; protocol errors are `Err`.
    pub async fn validate(
        &self,
        click: Position,
        character_id: u32,
    ) -> Result<ValidateResponse, ClientError> {
        let request = ValidateRequest {
            x: click.x,
            y: click.y,
            character_id,
        };
        let response = self
            .http
            .post(self.url("/validate"))
            .json(&request)
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn save_score(&self, name: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/scores"))
            .json(&SaveScoreRequest {
                name: name.to_string(),
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    pub async fn scores(&self, image_id: Option<u32>) -> Result<ScoresResponse, ClientError> {
        let mut request = self.http.get(self.url("/scores"));
        if let Some(image_id) = image_id {
            request = request.query(&[("imageId", image_id)]);
        }
        Self::json(request.send().await?).await
    }

    /// Answers for the active puzzle. Only development servers expose them.
    pub async fn debug_characters(&self) -> Result<Vec<Character>, ClientError> {
        let response = self.http.get(self.url("/debug/characters")).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::Unexpected(StatusCode::NOT_FOUND)),
            _ => Self::json(response).await,
        }
    }
}
