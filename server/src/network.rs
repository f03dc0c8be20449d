//! HTTP server wiring: router, session cookie middleware and background tasks

use crate::config::ServerConfig;
use crate::error::{ApiError, ErrorShape, GameError};
use crate::game::GameService;
use crate::routes;
use crate::session::SessionStore;
use crate::store::PuzzleStore;
use crate::utils::{find_cookie, get_timestamp, session_cookie};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sid";

/// Session token resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<GameService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(game: GameService, config: ServerConfig) -> Self {
        Self {
            game: Arc::new(game),
            config: Arc::new(config),
        }
    }

    fn verbose_errors(&self) -> bool {
        !self.config.is_production()
    }

    /// Error in `{error}` form
    pub fn reject(&self, error: GameError) -> ApiError {
        ApiError::new(error, ErrorShape::Plain, self.verbose_errors())
    }

    /// Error in the `{success, message}` form of the click endpoint
    pub fn reject_click(&self, error: GameError) -> ApiError {
        ApiError::new(error, ErrorShape::Validation, self.verbose_errors())
    }
}

/// Builds the application router for `state`
///
/// Debug routes and per-request logging only exist outside production.
pub fn router(state: AppState) -> Router {
    let production = state.config.is_production();

    let mut game_routes = Router::new()
        .route("/", get(routes::current_puzzle))
        .route("/images", get(routes::list_images))
        .route("/start", post(routes::start))
        .route("/validate", post(routes::validate))
        .route("/scores", get(routes::list_scores).post(routes::save_score));
    if !production {
        game_routes = game_routes.route("/debug/characters", get(routes::debug_characters));
    }

    let mut app = game_routes
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .route("/health", get(routes::health));
    if !production {
        app = app.layer(middleware::from_fn(log_requests));
    }

    app.with_state(state)
}

/// Attaches a live session to every request, issuing a new cookie when the
/// presented one is missing, unknown or expired.
async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| find_cookie(cookies, SESSION_COOKIE))
        .map(str::to_string);

    let (token, created) = match state
        .game
        .ensure_session(presented.as_deref(), get_timestamp())
        .await
    {
        Ok(resolved) => resolved,
        Err(error) => return state.reject(error).into_response(),
    };

    request
        .extensions_mut()
        .insert(SessionToken(token.clone()));
    let mut response = next.run(request).await;

    if created {
        let cookie = session_cookie(
            SESSION_COOKIE,
            &token,
            state.config.session_ttl(),
            state.config.is_production(),
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to encode session cookie: {}", e),
        }
    }

    response
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} {} {:.1}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    response
}

/// Periodically drops expired sessions from the store
fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = sessions.purge_expired().await {
                error!("Failed to purge expired sessions: {}", e);
            }
        }
    })
}

/// Puzzle HTTP server bound to its listening socket
pub struct Server {
    listener: TcpListener,
    state: AppState,
    sweep_interval: Duration,
}

impl Server {
    pub async fn new(
        config: ServerConfig,
        puzzles: Arc<dyn PuzzleStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        info!(
            "Server listening on http://{} ({:?} mode)",
            listener.local_addr()?,
            config.mode
        );

        let sweep_interval = config.sweep_interval();
        let game = GameService::new(puzzles, sessions, config.score_policy());

        Ok(Server {
            listener,
            state: AppState::new(game, config),
            sweep_interval,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the listener fails
    pub async fn run(self) -> std::io::Result<()> {
        let sweeper = spawn_session_sweeper(
            Arc::clone(self.state.game.sessions()),
            self.sweep_interval,
        );

        info!("Server started successfully");
        let result = axum::serve(self.listener, router(self.state)).await;

        sweeper.abort();
        result
    }
}
