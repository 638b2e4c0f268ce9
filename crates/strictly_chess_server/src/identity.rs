//! Identity validation against an external account service.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Result of validating a player's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Credentials were accepted.
    pub valid: bool,
    /// Account identifier.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Account type such as `human` or `agent`.
    #[serde(rename = "type", default = "default_account_type")]
    pub account_type: String,
    /// Name registered with the account.
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_account_type() -> String {
    "guest".to_string()
}

impl Identity {
    /// An unauthenticated guest.
    pub fn guest() -> Self {
        Self {
            valid: false,
            player_id: None,
            account_type: default_account_type(),
            display_name: None,
        }
    }
}

/// Credentials presented with a `join`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token.
    pub token: Option<String>,
    /// API key.
    pub api_key: Option<String>,
}

impl Credentials {
    /// Whether any credential was supplied.
    pub fn is_present(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            || self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Identity service failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Identity error: {} at {}:{}", message, file, line)]
pub struct IdentityError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl IdentityError {
    /// Creates a new identity error.
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

/// Validates player credentials.
#[async_trait::async_trait]
pub trait IdentityValidator: Send + Sync {
    /// Looks up the identity behind `credentials`.
    async fn validate(&self, credentials: &Credentials) -> Result<Identity, IdentityError>;
}

/// Resolves credentials to an identity, treating every failure as a guest.
#[instrument(skip_all)]
pub async fn resolve(validator: &dyn IdentityValidator, credentials: &Credentials) -> Identity {
    if !credentials.is_present() {
        return Identity::guest();
    }
    match validator.validate(credentials).await {
        Ok(identity) if identity.valid => {
            info!(player_id = ?identity.player_id, account_type = %identity.account_type, "Identity validated");
            identity
        }
        Ok(_) => {
            debug!("Credentials rejected, continuing as guest");
            Identity::guest()
        }
        Err(e) => {
            warn!(error = %e, "Identity validation failed, continuing as guest");
            Identity::guest()
        }
    }
}

/// Validator used when no identity service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestOnly;

#[async_trait::async_trait]
impl IdentityValidator for GuestOnly {
    async fn validate(&self, _credentials: &Credentials) -> Result<Identity, IdentityError> {
        Ok(Identity::guest())
    }
}

/// Validator calling `GET {base_url}/validate`.
#[derive(Debug, Clone)]
pub struct HttpIdentityValidator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityValidator {
    /// Creates a validator for the service at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityValidator for HttpIdentityValidator {
    #[instrument(skip_all, fields(base_url = %self.base_url))]
    async fn validate(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        let url = format!("{}/validate", self.base_url);
        debug!(url = %url, "Validating credentials");

        let mut request = self.client.get(&url);
        if let Some(token) = credentials.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }
        if let Some(key) = credentials.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::new(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::new(format!("Identity service returned {}", status)));
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| IdentityError::new(format!("Failed to decode identity: {}", e)))
    }
}
