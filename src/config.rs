//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILGRAPH_CONFIG` (environment variable)
//! 2. `~/.config/mailgraph/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailgraph\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Ingestion settings.
    pub ingest: IngestConfig,
    /// Search defaults.
    pub search: SearchConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// The mailbox owner's email address.
    pub central_user: Option<String>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Cap on the number of records ingested per build (None = all).
    pub max_emails: Option<usize>,
}

/// Search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit applied when a query does not set one.
    pub default_limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            central_user: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { max_emails: None }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILGRAPH_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailgraph").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.search.default_limit, 10);
        assert!(cfg.general.central_user.is_none());
        assert!(cfg.ingest.max_emails.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[general]
central_user = "me@example.com"

[search]
default_limit = 25
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.general.central_user.as_deref(), Some("me@example.com"));
        assert_eq!(cfg.search.default_limit, 25);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.default_limit, cfg.search.default_limit);
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
    }
}
