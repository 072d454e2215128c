//! Configuration types, built from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Trigger phrases used when `AUTOREPLY_KEYWORDS` is not set.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "kindly reply",
    "kindly reply to this mail.",
    "kindly reply with your resume.",
    "kindly reply with your email",
    "looking for your response.",
    "kindly reply back",
    "please respond",
    "awaiting your reply",
    "hearing from you",
    "look forward to hearing from you.",
];

/// OAuth scopes the credentials must grant.
pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.labels",
    "https://mail.google.com/",
    "https://www.googleapis.com/auth/gmail.compose",
    "https://www.googleapis.com/auth/gmail.modify",
];

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LABEL_NAME: &str = "Auto Replied";
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_INTERVAL_MIN_SECS: u64 = 45;
pub const DEFAULT_INTERVAL_MAX_SECS: u64 = 120;

/// Bounds (inclusive, seconds) the poll interval is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalBounds {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for IntervalBounds {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_INTERVAL_MIN_SECS,
            max_secs: DEFAULT_INTERVAL_MAX_SECS,
        }
    }
}

/// Where the authenticator finds its credentials.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client file (`installed` / `web` JSON as downloaded from the console).
    pub credentials_path: PathBuf,
    /// Authorized-user token file written by the local consent flow.
    pub token_path: PathBuf,
    /// Static bearer token; when set, the files above are not read.
    pub access_token: Option<secrecy::SecretString>,
}

/// Auto-responder configuration.
#[derive(Debug, Clone)]
pub struct AutoReplyConfig {
    pub port: u16,
    pub label_name: String,
    pub keywords: Vec<String>,
    pub interval: IntervalBounds,
    pub page_size: usize,
    pub auth: AuthConfig,
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            label_name: DEFAULT_LABEL_NAME.to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            interval: IntervalBounds::default(),
            page_size: DEFAULT_PAGE_SIZE,
            auth: AuthConfig {
                credentials_path: PathBuf::from("credentials.json"),
                token_path: PathBuf::from("token.json"),
                access_token: None,
            },
        }
    }
}

impl AutoReplyConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or(&lookup, "AUTOREPLY_PORT", defaults.port)?;

        let label_name = lookup("AUTOREPLY_LABEL_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.label_name);

        let keywords: Vec<String> = match lookup("AUTOREPLY_KEYWORDS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.keywords,
        };
        if keywords.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "AUTOREPLY_KEYWORDS".into(),
                message: "at least one trigger phrase is required".into(),
            });
        }

        let interval = IntervalBounds {
            min_secs: parse_or(&lookup, "AUTOREPLY_INTERVAL_MIN_SECS", DEFAULT_INTERVAL_MIN_SECS)?,
            max_secs: parse_or(&lookup, "AUTOREPLY_INTERVAL_MAX_SECS", DEFAULT_INTERVAL_MAX_SECS)?,
        };
        if interval.min_secs == 0 || interval.min_secs > interval.max_secs {
            return Err(ConfigError::InvalidValue {
                key: "AUTOREPLY_INTERVAL_MIN_SECS".into(),
                message: format!(
                    "expected 0 < min <= max, got {}..{}",
                    interval.min_secs, interval.max_secs
                ),
            });
        }

        let page_size = parse_or(&lookup, "AUTOREPLY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTOREPLY_PAGE_SIZE".into(),
                message: "must be at least 1".into(),
            });
        }

        let auth = AuthConfig {
            credentials_path: lookup("GMAIL_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.auth.credentials_path),
            token_path: lookup("GMAIL_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.auth.token_path),
            access_token: lookup("GMAIL_ACCESS_TOKEN")
                .filter(|s| !s.is_empty())
                .map(secrecy::SecretString::from),
        };

        Ok(Self {
            port,
            label_name,
            keywords,
            interval,
            page_size,
            auth,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AutoReplyConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.interval, IntervalBounds { min_secs: 45, max_secs: 120 });
        assert_eq!(config.keywords.len(), DEFAULT_KEYWORDS.len());
        assert!(config.auth.access_token.is_none());
    }

    #[test]
    fn keywords_override_is_comma_separated() {
        let config = AutoReplyConfig::from_lookup(lookup_from(&[(
            "AUTOREPLY_KEYWORDS",
            " urgent , call me,, ",
        )]))
        .unwrap();
        assert_eq!(config.keywords, vec!["urgent", "call me"]);
    }

    #[test]
    fn empty_keywords_rejected() {
        let err = AutoReplyConfig::from_lookup(lookup_from(&[("AUTOREPLY_KEYWORDS", " , ")]))
            .unwrap_err();
        assert!(err.to_string().contains("AUTOREPLY_KEYWORDS"));
    }

    #[test]
    fn invalid_port_rejected() {
        let err =
            AutoReplyConfig::from_lookup(lookup_from(&[("AUTOREPLY_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("AUTOREPLY_PORT"));
    }

    #[test]
    fn inverted_interval_rejected() {
        let result = AutoReplyConfig::from_lookup(lookup_from(&[
            ("AUTOREPLY_INTERVAL_MIN_SECS", "200"),
            ("AUTOREPLY_INTERVAL_MAX_SECS", "100"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn zero_page_size_rejected() {
        let result = AutoReplyConfig::from_lookup(lookup_from(&[("AUTOREPLY_PAGE_SIZE", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn static_access_token_is_kept_secret() {
        let config = AutoReplyConfig::from_lookup(lookup_from(&[
            ("GMAIL_ACCESS_TOKEN", "ya29.token"),
            ("GMAIL_TOKEN_PATH", "/tmp/tok.json"),
        ]))
        .unwrap();
        let token = config.auth.access_token.as_ref().unwrap();
        assert_eq!(token.expose_secret(), "ya29.token");
        assert!(!format!("{config:?}").contains("ya29.token"));
        assert_eq!(config.auth.token_path, PathBuf::from("/tmp/tok.json"));
    }
}
