// Client configuration: defaults, JSON file, environment overrides
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_JUDGE_URL: &str = "CODELAB_JUDGE_URL";
pub const ENV_SUBMIT_TIMEOUT: &str = "CODELAB_SUBMIT_TIMEOUT_SECS";
pub const ENV_POLL_TIMEOUT: &str = "CODELAB_POLL_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL: &str = "CODELAB_POLL_INTERVAL_MS";
pub const ENV_MEMORY_LIMIT: &str = "CODELAB_MEMORY_LIMIT_MB";
pub const ENV_ENCODE_SOURCE: &str = "CODELAB_ENCODE_SOURCE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
    #[error("poll timeout ({poll_secs}s) must exceed the submission timeout ({submit_secs}s)")]
    PollWindowTooShort { poll_secs: u64, submit_secs: u64 },
    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

fn default_judge_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_submit_timeout() -> u64 {
    10
}

fn default_poll_timeout() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_memory_limit() -> u32 {
    256
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_judge_url")]
    pub judge_url: String,
    /// Execution timeout handed to the judge with each submission
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,
    /// Wall-clock window for polling; must exceed `submit_timeout_secs`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Per HTTP request, independent of the poll window
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_memory_limit")]
    pub memory_limit_mb: u32,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub encode_source: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            judge_url: default_judge_url(),
            submit_timeout_secs: default_submit_timeout(),
            poll_timeout_secs: default_poll_timeout(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            memory_limit_mb: default_memory_limit(),
            language: Language::default(),
            encode_source: false,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value,
        })
}

impl ClientConfig {
    /// Load configuration from a JSON file; missing keys take defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup (normally the environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_JUDGE_URL) {
            self.judge_url = url.trim().to_string();
        }
        if let Some(v) = lookup(ENV_SUBMIT_TIMEOUT) {
            self.submit_timeout_secs = parse_env(ENV_SUBMIT_TIMEOUT, v)?;
        }
        if let Some(v) = lookup(ENV_POLL_TIMEOUT) {
            self.poll_timeout_secs = parse_env(ENV_POLL_TIMEOUT, v)?;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_ms = parse_env(ENV_POLL_INTERVAL, v)?;
        }
        if let Some(v) = lookup(ENV_MEMORY_LIMIT) {
            self.memory_limit_mb = parse_env(ENV_MEMORY_LIMIT, v)?;
        }
        if let Some(v) = lookup(ENV_ENCODE_SOURCE) {
            self.encode_source = matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.judge_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("judge_url is empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.poll_timeout_secs <= self.submit_timeout_secs {
            return Err(ConfigError::PollWindowTooShort {
                poll_secs: self.poll_timeout_secs,
                submit_secs: self.submit_timeout_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.submit_timeout_secs, 10);
        assert_eq!(config.poll_timeout_secs, 15);
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default()
            .with_overrides(lookup(&[
                (ENV_JUDGE_URL, " http://judge:9000 "),
                (ENV_POLL_TIMEOUT, "30"),
                (ENV_ENCODE_SOURCE, "true"),
            ]))
            .unwrap();

        assert_eq!(config.judge_url, "http://judge:9000");
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.encode_source);
        assert_eq!(config.submit_timeout_secs, 10);
    }

    #[test]
    fn test_bad_override_names_the_variable() {
        let err = ClientConfig::default()
            .with_overrides(lookup(&[(ENV_POLL_INTERVAL, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL));
    }

    #[test]
    fn test_poll_window_must_exceed_submit_timeout() {
        let config = ClientConfig {
            submit_timeout_secs: 10,
            poll_timeout_secs: 10,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PollWindowTooShort {
                poll_secs: 10,
                submit_secs: 10
            })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ClientConfig {
            poll_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"judge_url": "http://judge", "language": "sql"}"#).unwrap();
        assert_eq!(config.language, Language::Sql);
        assert_eq!(config.poll_timeout_secs, 15);
        assert_eq!(config.memory_limit_mb, 256);
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
