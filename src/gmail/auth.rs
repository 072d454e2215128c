//! Turns the artifacts of the OAuth consent flow into a Gmail client.
//!
//! The interactive consent flow itself runs elsewhere; it leaves behind:
//! - the OAuth client file (`credentials.json`, `installed` or `web` shape)
//! - an authorized-user token file holding a refresh token
//!
//! Access tokens are minted from the refresh token on demand and cached
//! until shortly before they expire.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{AuthConfig, GMAIL_SCOPES};
use crate::error::AuthError;
use crate::gmail::{GmailClient, MailClient};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the provider-reported expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Produces an authenticated mail client capability.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<Arc<dyn MailClient>, AuthError>;
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientFile {
    #[serde(default)]
    installed: Option<ClientSecrets>,
    #[serde(default)]
    web: Option<ClientSecrets>,
}

#[derive(Debug, Deserialize)]
struct AuthorizedUser {
    refresh_token: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Everything needed to exchange a refresh token for an access token.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub token_uri: String,
}

impl RefreshGrant {
    /// Read the client file and token file produced by the consent flow.
    ///
    /// Client id/secret in the token file take precedence; the client file is
    /// only read when the token file does not carry them.
    pub async fn from_files(credentials_path: &Path, token_path: &Path) -> Result<Self, AuthError> {
        let user: AuthorizedUser = read_json(token_path).await?;

        let (client_id, client_secret, token_uri) = match (user.client_id, user.client_secret) {
            (Some(id), Some(secret)) => (id, secret, None),
            _ => {
                let file: ClientFile = read_json(credentials_path).await?;
                let secrets = file.installed.or(file.web).ok_or_else(|| AuthError::Malformed {
                    path: credentials_path.display().to_string(),
                    reason: "expected an \"installed\" or \"web\" client".into(),
                })?;
                (secrets.client_id, secrets.client_secret, secrets.token_uri)
            }
        };

        if user.refresh_token.trim().is_empty() {
            return Err(AuthError::Malformed {
                path: token_path.display().to_string(),
                reason: "refresh_token is empty".into(),
            });
        }

        Ok(Self {
            client_id,
            client_secret: SecretString::from(client_secret),
            refresh_token: SecretString::from(user.refresh_token),
            token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AuthError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| AuthError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| AuthError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

/// Source of bearer tokens for API calls.
#[derive(Debug)]
pub enum TokenSource {
    /// A fixed token supplied by the operator; never refreshed.
    Static(SecretString),
    /// Refresh-token grant with an in-memory access-token cache.
    Refreshing {
        http: reqwest::Client,
        grant: RefreshGrant,
        cached: RwLock<Option<CachedToken>>,
    },
}

impl TokenSource {
    pub fn refreshing(http: reqwest::Client, grant: RefreshGrant) -> Self {
        TokenSource::Refreshing {
            http,
            grant,
            cached: RwLock::new(None),
        }
    }

    /// Current access token, refreshing it when missing or about to expire.
    pub async fn access_token(&self) -> Result<SecretString, AuthError> {
        let (http, grant, cached) = match self {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Refreshing { http, grant, cached } => (http, grant, cached),
        };

        if let Some(token) = cached.read().await.as_ref()
            && token.expires_at > Utc::now()
        {
            return Ok(token.token.clone());
        }

        let mut guard = cached.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = guard.as_ref()
            && token.expires_at > Utc::now()
        {
            return Ok(token.token.clone());
        }

        let fresh = refresh(http, grant).await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}

async fn refresh(http: &reqwest::Client, grant: &RefreshGrant) -> Result<CachedToken, AuthError> {
    debug!(token_uri = %grant.token_uri, "Refreshing Gmail access token");

    let scope = GMAIL_SCOPES.join(" ");
    let resp = http
        .post(&grant.token_uri)
        .form(&[
            ("client_id", grant.client_id.as_str()),
            ("client_secret", grant.client_secret.expose_secret()),
            ("refresh_token", grant.refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
            ("scope", scope.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::RefreshFailed(format!("token endpoint returned {status}: {body}")));
    }

    let parsed: TokenResponse = resp
        .json()
        .await
        .map_err(|e| AuthError::RefreshFailed(format!("unreadable token response: {e}")))?;

    if let Some(scope) = parsed.scope.as_deref() {
        let granted: Vec<&str> = scope.split_whitespace().collect();
        let missing: Vec<&str> = GMAIL_SCOPES
            .iter()
            .copied()
            .filter(|s| !granted.contains(s))
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Access token lacks some requested Gmail scopes");
        }
    }

    let lifetime = parsed.expires_in.unwrap_or(3600) - EXPIRY_SKEW_SECS;
    Ok(CachedToken {
        token: SecretString::from(parsed.access_token),
        expires_at: Utc::now() + ChronoDuration::seconds(lifetime.max(0)),
    })
}

/// Authenticates from the files (or static token) named in [`AuthConfig`].
pub struct FileAuthenticator {
    config: AuthConfig,
    http: reqwest::Client,
    api_base: String,
}

impl FileAuthenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            api_base: crate::gmail::client::DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the produced client at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl Authenticator for FileAuthenticator {
    async fn authenticate(&self) -> Result<Arc<dyn MailClient>, AuthError> {
        let tokens = match &self.config.access_token {
            Some(token) => {
                info!("Using static Gmail access token");
                TokenSource::Static(token.clone())
            }
            None => {
                let grant =
                    RefreshGrant::from_files(&self.config.credentials_path, &self.config.token_path)
                        .await?;
                TokenSource::refreshing(self.http.clone(), grant)
            }
        };

        // Mint a token up front so bad credentials fail the start, not the first tick.
        tokens.access_token().await?;
        info!("Authenticated with Gmail");

        Ok(Arc::new(GmailClient::new(
            self.http.clone(),
            Arc::new(tokens),
            self.api_base.clone(),
        )))
    }
}
