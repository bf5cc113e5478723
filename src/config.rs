use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_PORT: u16 = 3001;

/// Value shipped in the sample `.env`, treated the same as a missing key.
const PLACEHOLDER_KEY: &str = "paste-your-key-here";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY must be set (environment or .env file)")]
    MissingApiKey,

    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// How much we trust the model to follow the requested JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    Passthrough,
    Strict,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upstream_timeout: Option<Duration>,
    pub schema_mode: SchemaMode,
}

impl Config {
    /// Reads configuration from the process environment.
    /// Call after `dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY)
            .ok_or(ConfigError::MissingApiKey)?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        let schema_mode = match lookup("VERDICT_SCHEMA").as_deref().map(str::trim) {
            None | Some("") | Some("passthrough") => SchemaMode::Passthrough,
            Some("strict") => SchemaMode::Strict,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "VERDICT_SCHEMA",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            api_key,
            api_url: lookup("ANTHROPIC_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: lookup("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            upstream_timeout,
            schema_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ANTHROPIC_API_KEY", " sk-ant-test \n")]).unwrap();

        assert_eq!(config.api_key, "sk-ant-test");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.port, 3001);
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert!(config.upstream_timeout.is_none());
        assert_eq!(config.schema_mode, SchemaMode::Passthrough);
    }

    #[test]
    fn test_missing_or_placeholder_key() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingApiKey)));
        assert!(matches!(
            load(&[("ANTHROPIC_API_KEY", "   ")]),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            load(&[("ANTHROPIC_API_KEY", "paste-your-key-here")]),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("PORT", "8080"),
            ("UPSTREAM_TIMEOUT_SECS", "30"),
            ("VERDICT_SCHEMA", "strict"),
            ("STATIC_DIR", "/srv/www"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.schema_mode, SchemaMode::Strict);
        assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid PORT: http");

        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("VERDICT_SCHEMA", "loose")]).is_err());
        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("UPSTREAM_TIMEOUT_SECS", "-1")]).is_err());
    }
}
