use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{AgriError, Result};

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_LOG_LEVEL: &str = "agri_nourish=info,tower_http=info";
const MIN_IMAGE_BYTES: usize = 1024;
const MAX_IMAGE_BYTES: usize = 25 * 1024 * 1024;
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 120_000;

/// Main configuration structure loaded from agri_nourish.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub advisor: AdvisorConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_image_bytes: usize,
}

/// Which advisor answers form submissions and how long it may take
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// `auto`, `heuristic`, or `gemini`
    pub provider: String,
    pub model: String,
    pub timeout_ms: u64,
    pub endpoint: String,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub gemini_api_key: Option<String>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000))),
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_ms: 20_000,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            advisor: AdvisorConfig::default(),
            runtime: RuntimeConfig {
                gemini_api_key: None,
                log_level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}

/// True when an API key is missing or still the scaffold value
pub fn is_placeholder_key(key: &str) -> bool {
    let t = key.trim();
    t.is_empty()
        || t.contains("${")
        || t.eq_ignore_ascii_case("PLACEHOLDER_API_KEY")
        || t.eq_ignore_ascii_case("your-api-key-here")
        || t.eq_ignore_ascii_case("changeme")
}

/// Read the config file; a missing file is `None`, any other failure is an error
pub fn read_config_file(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AgriError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        }),
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses AGRI_NOURISH_CONFIG or defaults to "agri_nourish.toml".
    pub fn load() -> Result<Self> {
        // Env files: AGRI_ENV_FILE if set, else ./.env then ./.env.local
        if let Ok(env_path) = std::env::var("AGRI_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
            let _ = dotenvy::from_path(".env.local");
        }

        let config_path = std::env::var("AGRI_NOURISH_CONFIG")
            .unwrap_or_else(|_| "agri_nourish.toml".to_string());

        let mut config = match read_config_file(Path::new(&config_path))? {
            Some(content) => Self::from_toml(&content)?,
            None => {
                tracing::warn!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.runtime.log_level = DEFAULT_LOG_LEVEL.to_string();
        Ok(config)
    }

    /// Apply environment overrides (env-first) using the given lookup
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = var("AGRI_HTTP_BIND") {
            self.server.bind = bind.parse().map_err(|e| AgriError::Config {
                message: format!("AGRI_HTTP_BIND '{}' is not a socket address: {}", bind, e),
            })?;
            tracing::debug!("AGRI_HTTP_BIND env override applied");
        }
        if let Some(provider) = var("AGRI_ADVISOR") {
            self.advisor.provider = provider;
        }
        if let Some(timeout) = var("AGRI_ADVISOR_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.advisor.timeout_ms = timeout;
        }
        if let Some(limit) = var("AGRI_MAX_IMAGE_BYTES").and_then(|v| v.parse().ok()) {
            self.server.max_image_bytes = limit;
        }
        if let Some(model) = var("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.advisor.model = model;
        }
        self.runtime.gemini_api_key = var("GEMINI_API_KEY");
        self.runtime.log_level = var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Ok(())
    }

    /// Clamp numeric settings and reject unknown providers
    pub fn validate(&mut self) -> Result<()> {
        self.advisor.provider = self.advisor.provider.trim().to_lowercase();
        match self.advisor.provider.as_str() {
            "auto" | "heuristic" | "gemini" => {}
            other => {
                return Err(AgriError::Config {
                    message: format!(
                        "unknown advisor provider '{}', expected auto, heuristic, or gemini",
                        other
                    ),
                });
            }
        }

        let timeout = self.advisor.timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        if timeout != self.advisor.timeout_ms {
            tracing::warn!(
                "advisor timeout {}ms out of range, clamping to {}ms",
                self.advisor.timeout_ms,
                timeout
            );
            self.advisor.timeout_ms = timeout;
        }

        let limit = self
            .server
            .max_image_bytes
            .clamp(MIN_IMAGE_BYTES, MAX_IMAGE_BYTES);
        if limit != self.server.max_image_bytes {
            tracing::warn!(
                "max_image_bytes {} out of range, clamping to {}",
                self.server.max_image_bytes,
                limit
            );
            self.server.max_image_bytes = limit;
        }
        Ok(())
    }

    /// The Gemini key, if one is set and is not a placeholder
    pub fn gemini_key(&self) -> Option<&str> {
        self.runtime
            .gemini_api_key
            .as_deref()
            .filter(|k| !is_placeholder_key(k))
    }
}
