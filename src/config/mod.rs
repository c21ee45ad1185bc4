use crate::error::{CavizError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Environment variable checked for an access token when `--token` is absent
pub const TOKEN_ENV_VAR: &str = "CAVIZ_ACCESS_TOKEN";

/// Main configuration structure (`config.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Informational only, shown by `caviz config show`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub graph: GraphSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tenant_id: None,
            graph: GraphSettings::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Microsoft Graph client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphSettings {
    pub base_url: String,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
    pub search_limit: u32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: GRAPH_API_BASE.to_string(),
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30000,
            timeout_secs: 30,
            search_limit: 10,
        }
    }
}

impl GraphSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(CavizError::InvalidConfig("graph.max_retries must be at least 1".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CavizError::InvalidConfig(format!(
                "graph.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.search_limit == 0 || self.search_limit > 999 {
            return Err(CavizError::InvalidConfig(
                "graph.search_limit must be between 1 and 999".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "caviz", "caviz").ok_or_else(|| {
            CavizError::ConfigError("Failed to determine config directory".into())
        })?;

        Ok(Self::with_dir(project_dirs.config_dir()))
    }

    /// Use an explicit config directory (nothing is created until a save)
    pub fn with_dir(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn env_file(&self) -> PathBuf {
        self.config_dir.join(".env")
    }

    /// Load main config, falling back to defaults when the file is missing
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        config.graph.validate()?;
        Ok(config)
    }

    /// Save main config
    pub fn save_config(&self, config: &Config) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)?;
        }

        let contents = toml::to_string_pretty(config)
            .map_err(|e| CavizError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(self.config_file(), contents)?;
        Ok(())
    }

    /// Resolve the Graph access token
    ///
    /// Order: explicit value, `CAVIZ_ACCESS_TOKEN`, then `ACCESS_TOKEN` in the
    /// config directory's `.env` file.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }

        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        self.token_from_env_file()?.ok_or(CavizError::TokenNotFound)
    }

    fn token_from_env_file(&self) -> Result<Option<String>> {
        let path = self.env_file();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let vars = Self::parse_env_file(&contents);
        Ok(vars
            .get("ACCESS_TOKEN")
            .or_else(|| vars.get("access_token"))
            .filter(|t| !t.is_empty())
            .cloned())
    }

    /// Parse simple .env file format
    fn parse_env_file(contents: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim();

                let value = if value.len() >= 2
                    && ((value.starts_with('"') && value.ends_with('"'))
                        || (value.starts_with('\'') && value.ends_with('\'')))
                {
                    value[1..value.len() - 1].to_string()
                } else {
                    value.to_string()
                };

                vars.insert(key.trim().to_string(), value);
            }
        }

        vars
    }
}
