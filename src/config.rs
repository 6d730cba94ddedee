//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Local tool: only the UI process on this machine talks to us
            host: Ipv4Addr::new(127, 0, 0, 1),
            port: 8501,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database/mcp_database.db"),
            busy_timeout_ms: 5000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:8501".to_string()],
        }
    }
}

/// Text-generation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Missing key means generation is disabled, not a startup failure
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Governance rule parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    pub accuracy_threshold: f64,
    pub pii_markers: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: 0.9,
            pii_markers: vec!["개인정보".to_string(), "PII".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub generation: GenerationConfig,
    pub governance: GovernanceConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: parsed_var("HOST").unwrap_or_else(|| ServerConfig::default().host),
            port: parsed_var("PORT").unwrap_or_else(|| ServerConfig::default().port),
        };

        let database = DatabaseConfig {
            path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| DatabaseConfig::default().path),
            busy_timeout_ms: parsed_var("DATABASE_BUSY_TIMEOUT_MS")
                .unwrap_or_else(|| DatabaseConfig::default().busy_timeout_ms),
        };

        let cors = CorsConfig {
            allowed_origins: list_var("ALLOWED_ORIGINS")
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let defaults = GenerationConfig::default();
        let generation = GenerationConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: Self::parse_base_url(
                &std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            )?,
            timeout_secs: parsed_var("GENERATION_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
        };

        if generation.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "GENERATION_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let governance = GovernanceConfig {
            accuracy_threshold: parsed_var("ACCURACY_THRESHOLD")
                .unwrap_or_else(|| GovernanceConfig::default().accuracy_threshold),
            pii_markers: list_var("PII_MARKERS")
                .unwrap_or_else(|| GovernanceConfig::default().pii_markers),
        };

        if !(0.0..=1.0).contains(&governance.accuracy_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "ACCURACY_THRESHOLD must be within [0, 1], got {}",
                governance.accuracy_threshold
            )));
        }

        Ok(Self {
            server,
            database,
            cors,
            generation,
            governance,
        })
    }

    /// Validate the generation endpoint and strip any trailing slash
    fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
        match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Ok(raw.trim_end_matches('/').to_string())
            }
            Ok(parsed) => Err(ConfigError::InvalidValue(format!(
                "GEMINI_BASE_URL must use http or https, got {}",
                parsed.scheme()
            ))),
            Err(_) => Err(ConfigError::InvalidValue(
                "Invalid GEMINI_BASE_URL format (expected https://...)".to_string(),
            )),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn list_var(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|s| {
        s.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
