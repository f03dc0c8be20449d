//! Command line and environment configuration for the puzzle server.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment mode. Development exposes error details, logs every request
/// and serves the debug routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

/// Whether a score may be saved before every character is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
    RequireCompletion,
    AllowPartial,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Hidden character puzzle server")]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Deployment mode
    #[arg(short, long, env = "APP_MODE", value_enum, default_value = "development")]
    pub mode: RunMode,

    /// JSON seed file with images and characters (built-in puzzles when absent)
    #[arg(long, env = "SEED_FILE")]
    pub seed: Option<PathBuf>,

    /// Idle seconds before a session expires
    #[arg(long = "session-ttl", env = "SESSION_TTL_SECS", default_value = "86400")]
    pub session_ttl_secs: u64,

    /// Seconds between expired-session sweeps
    #[arg(long = "sweep-interval", env = "SESSION_SWEEP_SECS", default_value = "60")]
    pub sweep_interval_secs: u64,

    /// Accept scores before all characters are found
    #[arg(long, env = "ALLOW_PARTIAL_SCORES")]
    pub allow_partial_scores: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            mode: RunMode::Development,
            seed: None,
            session_ttl_secs: 86_400,
            sweep_interval_secs: 60,
            allow_partial_scores: false,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.mode == RunMode::Production
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs.max(1))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn score_policy(&self) -> ScorePolicy {
        if self.allow_partial_scores {
            ScorePolicy::AllowPartial
        } else {
            ScorePolicy::RequireCompletion
        }
    }

    /// `env_logger` filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self.mode {
            RunMode::Development => "debug",
            RunMode::Production => "warn",
        }
    }
}
