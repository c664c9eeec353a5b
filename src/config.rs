use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PUSH_MAX_REDIRECTS,
    DEFAULT_PUSH_TIMEOUT_SECS,
};
use crate::store::ImportIdPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Remote site
    pub root_url: String,
    pub endpoint: String,
    pub auth_token: Option<String>,

    // Requests
    pub fetch_timeout: Duration,
    pub push_timeout: Duration,
    pub push_max_redirects: usize,

    // Import
    pub import_id_policy: ImportIdPolicy,
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Remote site
            root_url: required_env("WP_ROOT_URL")?,
            endpoint: env_or_default("WP_ENDPOINT", DEFAULT_ENDPOINT),
            auth_token: optional_env("WP_AUTH_TOKEN"),

            // Requests
            fetch_timeout: Duration::from_secs(parse_env_u64(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            push_timeout: Duration::from_secs(parse_env_u64(
                "PUSH_TIMEOUT_SECS",
                DEFAULT_PUSH_TIMEOUT_SECS,
            )?),
            push_max_redirects: parse_env_usize("PUSH_MAX_REDIRECTS", DEFAULT_PUSH_MAX_REDIRECTS)?,

            // Import
            import_id_policy: parse_import_id_policy(&env_or_default(
                "IMPORT_ID_POLICY",
                "reuse-if-free",
            ))?,
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/posts.sqlite")),
        })
    }

    /// Configuration with defaults for tests, pointed at `root_url`.
    #[must_use]
    pub fn for_testing(root_url: &str) -> Self {
        Self {
            root_url: root_url.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_token: None,
            fetch_timeout: Duration::from_secs(5),
            push_timeout: Duration::from_secs(5),
            push_max_redirects: DEFAULT_PUSH_MAX_REDIRECTS,
            import_id_policy: ImportIdPolicy::default(),
            database_path: std::env::temp_dir().join("wp-rest-client-test.sqlite"),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "WP_ROOT_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if !self.root_url.starts_with("http://") && !self.root_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                name: "WP_ROOT_URL".to_string(),
                message: format!("must be an http(s) URL, got '{}'", self.root_url),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "FETCH_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.push_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "PUSH_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Default push target: the listing endpoint on the configured site.
    #[must_use]
    pub fn default_push_url(&self) -> String {
        format!("{}{}", self.root_url, self.endpoint)
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_import_id_policy(value: &str) -> Result<ImportIdPolicy, ConfigError> {
    match value.to_lowercase().as_str() {
        "reuse-if-free" | "reuse" => Ok(ImportIdPolicy::ReuseIfFree),
        "overwrite" => Ok(ImportIdPolicy::Overwrite),
        "always-create" | "create" => Ok(ImportIdPolicy::AlwaysCreate),
        _ => Err(ConfigError::InvalidValue {
            name: "IMPORT_ID_POLICY".to_string(),
            message: format!(
                "must be 'reuse-if-free', 'overwrite' or 'always-create', got '{value}'"
            ),
        }),
    }
}
