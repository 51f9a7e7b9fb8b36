//! Pulse configuration loaded from file and environment.
//!
//! | Source | Example |
//! |--------|---------|
//! | defaults | port 8010, storage `./data`, model `claude-sonnet-4-5-20250929` |
//! | `PULSE_CONFIG` file (default `config/pulse.toml`) | `port = 9000` |
//! | `PULSE__*` env | `PULSE__LLM__MODEL=...`, `PULSE__PERSIST_INSIGHTS=true` |
//! | `ANTHROPIC_API_KEY` | used when `llm.api_key` is unset |
//!
//! `.env` is read first via dotenvy. The resulting value is passed down explicitly;
//! the generator never reads the environment itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_secs() -> u64 {
    30
}

/// Text-generation settings. `api_key: None` means live generation is off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-call upper bound; the upstream call is never retried.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// True when a non-blank credential is present.
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Label used in logs and the dashboard header.
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// Base directory for the sled metrics store.
    pub storage_path: String,
    /// Append successful AI insights to the `ai_insights` table.
    #[serde(default)]
    pub persist_insights: bool,
    /// Where the dashboard add-on reaches the gateway.
    pub gateway_url: String,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            app_name: "Contractor Pulse".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8010,
            storage_path: "./data".to_string(),
            persist_insights: false,
            gateway_url: "http://127.0.0.1:8010".to_string(),
            llm: LlmConfig::default(),
        }
    }
}

impl PulseConfig {
    /// Load `.env`, then defaults < config file < `PULSE__` env. Falls back to
    /// `ANTHROPIC_API_KEY` for the credential.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let config_path =
            std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "config/pulse".to_string());
        let mut cfg = Self::load_from(Path::new(&config_path))?;
        if !cfg.llm.has_credential() {
            cfg.llm.api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(cfg)
    }

    /// Defaults < file at `path` (if it exists, any extension `config` understands) < env.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = PulseConfig::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("persist_insights", false)?
            .set_default("gateway_url", defaults.gateway_url)?;

        let with_ext = path.with_extension("toml");
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else if with_ext.exists() {
            builder.add_source(config::File::from(with_ext.as_path()))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("PULSE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Sled directory for the metrics store.
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("pulse_metrics")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PulseConfig::load_from(&dir.path().join("missing")).unwrap();
        assert_eq!(cfg.app_name, "Contractor Pulse");
        assert_eq!(cfg.llm.max_tokens, 1024);
        assert!((cfg.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert!(cfg.store_path().ends_with("pulse_metrics"));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(
            &path,
            "port = 9100\npersist_insights = true\n[llm]\napi_key = \"sk-file\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        let cfg = PulseConfig::load_from(&path).unwrap();
        assert_eq!(cfg.port, 9100);
        assert!(cfg.persist_insights);
        assert!(cfg.llm.has_credential());
        assert_eq!(cfg.llm.timeout_secs, 5);
        assert_eq!(cfg.llm.model, "claude-sonnet-4-5-20250929");
    }
}
