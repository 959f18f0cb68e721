use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONFIG_FILE: &str = "config.json";
const INFERENCE_URL_ENV: &str = "NEUROPREDICT_INFERENCE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    #[default]
    Simulated,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub backend: InferenceBackend,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_simulated_delay_ms() -> u64 {
    3000
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            simulated_delay_ms: default_simulated_delay_ms(),
        }
    }
}

impl Config {
    /// Load `config.json` from the data directory, creating it on first run
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("neuropredict")
        });

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let config_path = data_dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            Self::read(&config_path, &data_dir)?
        } else {
            let config = Self::default_config(data_dir);
            config.save()?;
            config
        };

        config.apply_env_override(std::env::var(INFERENCE_URL_ENV).ok());
        Ok(config)
    }

    fn read(path: &Path, data_dir: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path).context("Failed to read config.json")?;

        if config_str.trim().is_empty() {
            warn!(path = %path.display(), "config file is empty, using defaults");
            return Ok(Self::default_config(data_dir.to_path_buf()));
        }

        match serde_json::from_str::<Config>(&config_str) {
            Ok(mut config) => {
                config.data_dir = data_dir.to_path_buf();
                Ok(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config.json, using defaults");
                Ok(Self::default_config(data_dir.to_path_buf()))
            }
        }
    }

    fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.inference.base_url = url;
        }
    }

    pub fn save(&self) -> Result<()> {
        let json_str = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(self.config_path(), json_str).context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            inference: InferenceConfig::default(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Directory holding the session and record files
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}
