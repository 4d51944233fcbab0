use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub pubchem: PubChemConfig,

    pub auth: AuthConfig,

    pub chat: ChatConfig,

    pub search: SearchConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite database backing the on-device key-value store
    pub database_path: String,

    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit logs as JSON lines instead of text
    pub log_json: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/safechem.db".to_string(),
            log_level: "warn".to_string(),
            log_json: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubChemConfig {
    pub base_url: String,

    pub view_url: String,

    /// Request timeout in seconds (default: 15)
    pub request_timeout_seconds: u64,
}

impl Default for PubChemConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string(),
            view_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug_view".to_string(),
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the account API. Overridden by `SAFECHEM_API_URL`.
    pub base_url: Option<String>,

    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Preferred when set. Overridden by `SAFECHEM_GEMINI_API_KEY`.
    pub gemini_api_key: Option<String>,

    /// Overridden by `SAFECHEM_OPENAI_API_KEY`.
    pub openai_api_key: Option<String>,

    pub gemini_url: String,

    pub openai_url: String,

    pub openai_model: String,

    pub temperature: f32,

    pub max_output_tokens: u32,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            gemini_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
                .to_string(),
            openai_url: "https://api.openai.com/v1/chat/completions".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_output_tokens: 500,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before the remote lookup fires
    pub debounce_ms: u64,

    /// Queries shorter than this (after trimming) yield no results
    pub min_query_length: usize,

    pub remote_enabled: bool,

    /// Upper bound on remote compounds merged into one result set
    pub max_remote_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_length: 2,
            remote_enabled: true,
            max_remote_results: 10,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Login attempts allowed per username inside the window.
    pub max_login_attempts: usize,

    pub login_window_seconds: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            login_window_seconds: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            pubchem: PubChemConfig::default(),
            auth: AuthConfig::default(),
            chat: ChatConfig::default(),
            search: SearchConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is the normal case.
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SAFECHEM_API_URL")
            && !url.is_empty()
        {
            self.auth.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("SAFECHEM_GEMINI_API_KEY")
            && !key.is_empty()
        {
            self.chat.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("SAFECHEM_OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.chat.openai_api_key = Some(key);
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("safechem").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".safechem").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.max_login_attempts == 0 {
            anyhow::bail!("security.max_login_attempts must be > 0");
        }

        if self.security.login_window_seconds == 0 {
            anyhow::bail!("security.login_window_seconds must be > 0");
        }

        for (name, url) in [
            ("pubchem.base_url", Some(&self.pubchem.base_url)),
            ("pubchem.view_url", Some(&self.pubchem.view_url)),
            ("auth.base_url", self.auth.base_url.as_ref()),
            ("chat.gemini_url", Some(&self.chat.gemini_url)),
            ("chat.openai_url", Some(&self.chat.openai_url)),
        ] {
            if let Some(url) = url {
                let parsed =
                    url::Url::parse(url).with_context(|| format!("Invalid {name}: {url}"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("{name} must be an http(s) URL, got {url}");
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub const fn login_window(&self) -> Duration {
        Duration::from_secs(self.security.login_window_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.min_query_length, 2);
        assert_eq!(config.auth.request_timeout_seconds, 10);
        assert_eq!(config.chat.request_timeout_seconds, 30);
        assert_eq!(config.security.max_login_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[pubchem]"));
        assert!(toml_str.contains("[search]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [search]
            debounce_ms = 150

            [auth]
            base_url = "https://api.example.com"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.search.debounce(), Duration::from_millis(150));
        assert_eq!(config.auth.base_url.as_deref(), Some("https://api.example.com"));

        assert_eq!(config.search.min_query_length, 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.security.login_window_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.base_url = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());
    }
}
