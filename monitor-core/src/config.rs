//! Run configuration, loaded once from a TOML file.

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

use crate::{strip_subreddit_prefix, ConfigError, CoreError, PostSort};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Credentials for a Reddit "script" app.
#[derive(Clone, Deserialize)]
pub struct RedditCredentials {
    pub user_agent: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("user_agent", &self.user_agent)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RedditCredentials {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("reddit.user_agent", &self.user_agent),
            ("reddit.client_id", &self.client_id),
            ("reddit.client_secret", &self.client_secret),
            ("reddit.username", &self.username),
            ("reddit.password", &self.password),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub reddit: RedditCredentials,
    /// Subreddits to monitor, scanned in this order.
    pub subreddits: Vec<String>,
    /// Keywords to search for (case-insensitive).
    pub keywords: Vec<String>,
    /// Number of posts to fetch per subreddit.
    #[serde(default = "default_posts_limit")]
    pub posts_limit: u32,
    #[serde(default)]
    pub sort: PostSort,
    /// Maximum number of subreddits fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_posts_limit() -> u32 {
    25
}

fn default_concurrency() -> usize {
    1
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            ErrorKind::PermissionDenied => CoreError::Config(ConfigError::PermissionDenied {
                path: path.display().to_string(),
            }),
            _ => CoreError::Io(e),
        })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "Loaded configuration from {}: {} subreddits, {} keywords",
            path.display(),
            config.subreddits.len(),
            config.keywords.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.subreddits = config
            .subreddits
            .iter()
            .map(|name| strip_subreddit_prefix(name).to_string())
            .collect();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reddit.validate()?;

        if self.posts_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "posts_limit".to_string(),
                value: self.posts_limit.to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                value: self.concurrency.to_string(),
            });
        }
        if let Some(blank) = self.subreddits.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "subreddits".to_string(),
                value: format!("{:?}", blank),
            });
        }
        if let Some(blank) = self.keywords.iter().find(|k| k.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "keywords".to_string(),
                value: format!("{:?}", blank),
            });
        }

        if self.subreddits.is_empty() {
            tracing::warn!("No subreddits configured; the report will be empty");
        }
        if self.keywords.is_empty() {
            tracing::warn!("No keywords configured; no post can match");
        }
        Ok(())
    }
}
