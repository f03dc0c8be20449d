//! Request handlers. Each one resolves the session token attached by the
//! session middleware and delegates to `GameService`.

use crate::error::{ApiError, GameError};
use crate::network::{AppState, SessionToken};
use crate::utils::get_timestamp;
use axum::async_trait;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, FromRequest, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use shared::{
    Character, ErrorResponse, ImageSummary, SaveScoreRequest, SaveScoreResponse, ScoresQuery,
    ScoresResponse, StartRequest, ValidateRequest, ValidateResponse,
};

/// Request body accepted either as JSON or as an urlencoded form post
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

/// A body that could not be read into the expected shape
#[derive(Debug)]
pub struct BodyRejection(pub String);

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: self.0 }),
        )
            .into_response()
    }
}

impl From<BodyRejection> for GameError {
    fn from(rejection: BodyRejection) -> Self {
        GameError::InvalidInput(rejection.0)
    }
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| content_type.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = BodyRejection;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&request) {
            let Form(value) = Form::<T>::from_request(request, state)
                .await
                .map_err(|rejection| BodyRejection(rejection.body_text()))?;
            Ok(JsonOrForm(value))
        } else {
            let Json(value) = Json::<T>::from_request(request, state)
                .await
                .map_err(|rejection| BodyRejection(rejection.body_text()))?;
            Ok(JsonOrForm(value))
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// The active puzzle, or a redirect to the image list when none is started
pub async fn current_puzzle(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Response, ApiError> {
    let view = state
        .game
        .current_puzzle(&token, get_timestamp())
        .await
        .map_err(|e| state.reject(e))?;

    Ok(match view {
        Some(view) => Json(view).into_response(),
        None => Redirect::to("/images").into_response(),
    })
}

pub async fn list_images(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageSummary>>, ApiError> {
    let images = state.game.list_images().await.map_err(|e| state.reject(e))?;
    Ok(Json(images))
}

pub async fn start(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    payload: Result<JsonOrForm<StartRequest>, BodyRejection>,
) -> Result<Redirect, ApiError> {
    let JsonOrForm(request) = payload.map_err(|r| state.reject(r.into()))?;

    state
        .game
        .start_puzzle(&token, request.image_id, get_timestamp())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Redirect::to("/"))
}

pub async fn validate(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    payload: Result<JsonOrForm<ValidateRequest>, BodyRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let JsonOrForm(request) = payload.map_err(|r| state.reject_click(r.into()))?;

    let outcome = state
        .game
        .validate_click(
            &token,
            request.click(),
            request.character_id,
            get_timestamp(),
        )
        .await
        .map_err(|e| state.reject_click(e))?;
    Ok(Json(outcome.into()))
}

pub async fn save_score(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    payload: Result<JsonOrForm<SaveScoreRequest>, BodyRejection>,
) -> Result<Json<SaveScoreResponse>, ApiError> {
    let JsonOrForm(request) = payload.map_err(|r| state.reject(r.into()))?;

    state
        .game
        .record_score(&token, &request.name, get_timestamp())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(SaveScoreResponse { success: true }))
}

pub async fn list_scores(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    query: Result<Query<ScoresQuery>, QueryRejection>,
) -> Result<Json<ScoresResponse>, ApiError> {
    let Query(query) =
        query.map_err(|r| state.reject(GameError::invalid_input(r.body_text())))?;

    let scores = state
        .game
        .list_scores(&token, query.image_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(scores))
}

/// Character positions for the active puzzle. Only routed in development.
pub async fn debug_characters(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Json<Vec<Character>>, ApiError> {
    let characters = state
        .game
        .debug_characters(&token)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(characters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract<T: DeserializeOwned + Send>(
        content_type: &str,
        body: &'static str,
    ) -> Result<T, BodyRejection> {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        JsonOrForm::<T>::from_request(request, &())
            .await
            .map(|JsonOrForm(value)| value)
    }

    #[tokio::test]
    async fn test_json_body() {
        let request: StartRequest = extract("application/json", r#"{"imageId":2}"#)
            .await
            .unwrap();
        assert_eq!(request.image_id, 2);
    }

    #[tokio::test]
    async fn test_form_body() {
        let request: StartRequest =
            extract("application/x-www-form-urlencoded", "imageId=3")
                .await
                .unwrap();
        assert_eq!(request.image_id, 3);

        let request: ValidateRequest = extract(
            "application/x-www-form-urlencoded",
            "x=0.5&y=0.25&characterId=7",
        )
        .await
        .unwrap();
        assert_eq!(request.character_id, 7);
        assert_eq!(request.y, 0.25);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_input() {
        let result: Result<ValidateRequest, _> =
            extract("application/json", r#"{"x":"left"}"#).await;
        let error = GameError::from(result.unwrap_err());
        assert!(matches!(error, GameError::InvalidInput(_)));
        assert_eq!(error.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"imageId":2}"#))
            .unwrap();
        let result = JsonOrForm::<StartRequest>::from_request(request, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unhandled_rejection_is_bad_request() {
        let rejection = extract::<StartRequest>("application/json", "{")
            .await
            .unwrap_err();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!body.error.is_empty());
    }

    #[test]
    fn test_blank_scores_query_falls_back() {
        let uri: axum::http::Uri = "/scores?imageId=".parse().unwrap();
        let Query(query) = Query::<ScoresQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.image_id, None);

        let uri: axum::http::Uri = "/scores?imageId=2".parse().unwrap();
        let Query(query) = Query::<ScoresQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.image_id, Some(2));
    }
}
