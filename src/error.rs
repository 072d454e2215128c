//! Error types for the auto-responder.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Gmail error: {0}")]
    Gmail(#[from] GmailError),
}

/// Result type alias for the auto-responder.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures while turning on-disk OAuth artifacts into a usable client.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials in {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

/// Errors from the mail provider API.
#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    /// The provider refused a create because the resource already exists (HTTP 409).
    #[error("{resource} already exists")]
    Conflict { resource: String },

    #[error("Gmail API returned {status} for {operation}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error during {operation}: {reason}")]
    Http { operation: String, reason: String },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Label {name} reported as existing but not found in label list")]
    LabelNotFound { name: String },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl GmailError {
    /// Whether the provider signalled that the resource already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GmailError::Conflict { .. })
    }
}
