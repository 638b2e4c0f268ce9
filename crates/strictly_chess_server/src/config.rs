//! Server configuration.

use crate::identity::{GuestOnly, HttpIdentityValidator, IdentityValidator};
use crate::reporter::{DisabledReporter, HttpResultReporter, PointScale, ResultReporter};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Environment variable naming the identity service base URL.
pub const ENV_IDENTITY_URL: &str = "STRICTLY_CHESS_IDENTITY_URL";
/// Environment variable naming the scoring service base URL.
pub const ENV_SCORE_URL: &str = "STRICTLY_CHESS_SCORE_URL";
/// Environment variable holding the scoring service API key.
pub const ENV_SCORE_API_KEY: &str = "STRICTLY_CHESS_SCORE_API_KEY";
/// Environment variable selecting a tournament for result reporting.
pub const ENV_TOURNAMENT_ID: &str = "STRICTLY_CHESS_TOURNAMENT_ID";

/// Configuration for the chess server.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Room used by connections to `/ws`.
    #[serde(default = "default_room")]
    default_room: String,

    /// Identity service base URL. Everyone is a guest when unset.
    #[serde(default)]
    identity_url: Option<String>,

    /// Scoring service base URL. Reporting is disabled when unset.
    #[serde(default)]
    score_url: Option<String>,

    /// API key sent to the scoring service.
    #[serde(default)]
    score_api_key: Option<String>,

    /// Tournament receiving results instead of the point table.
    #[serde(default)]
    tournament_id: Option<String>,

    /// Points per outcome outside tournaments.
    #[serde(default)]
    points: PointScale,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_room() -> String {
    "lobby".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_room: default_room(),
            identity_url: None,
            score_url: None,
            score_api_key: None,
            tournament_id: None,
            points: PointScale::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, otherwise defaults, then applies the environment.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Replaces collaborator settings with any values `lookup` provides.
    ///
    /// Empty values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = read(ENV_IDENTITY_URL) {
            debug!(%url, "Identity URL from environment");
            self.identity_url = Some(url);
        }
        if let Some(url) = read(ENV_SCORE_URL) {
            debug!(%url, "Score URL from environment");
            self.score_url = Some(url);
        }
        if let Some(key) = read(ENV_SCORE_API_KEY) {
            self.score_api_key = Some(key);
        }
        if let Some(id) = read(ENV_TOURNAMENT_ID) {
            debug!(tournament_id = %id, "Tournament from environment");
            self.tournament_id = Some(id);
        }
        self
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builds the identity validator for this configuration.
    #[instrument(skip(self))]
    pub fn identity_validator(&self) -> Arc<dyn IdentityValidator> {
        match &self.identity_url {
            Some(url) => {
                info!(%url, "Identity validation enabled");
                Arc::new(HttpIdentityValidator::new(url.clone()))
            }
            None => {
                info!("No identity service configured, all players are guests");
                Arc::new(GuestOnly)
            }
        }
    }

    /// Builds the result reporter for this configuration.
    #[instrument(skip(self))]
    pub fn result_reporter(&self) -> Arc<dyn ResultReporter> {
        match &self.score_url {
            Some(url) => {
                info!(%url, tournament_id = ?self.tournament_id, "Result reporting enabled");
                Arc::new(HttpResultReporter::new(
                    url.clone(),
                    self.score_api_key.clone(),
                    self.tournament_id.clone(),
                    self.points,
                ))
            }
            None => {
                info!("No scoring service configured, results are not reported");
                Arc::new(DisabledReporter)
            }
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
