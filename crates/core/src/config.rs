use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::InferenceBackend;
use crate::geometry::{Strides, Window};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_DATA_DIR: &str = "SRTILE_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub tiling: TilingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    /// "cuda" or "tensorrt"; unknown values fall back to cuda.
    pub backend: String,
    pub trt_cache_dir: PathBuf,
    /// Override for models with dynamic spatial input dims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TilingConfig {
    pub stride_x: usize,
    pub stride_y: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            tiling: TilingConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/srcnn.onnx"),
            backend: "cuda".to_string(),
            trt_cache_dir: PathBuf::from("trt_cache"),
            window: None,
        }
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        // Matches the SRCNN training window stride of 14 pixels.
        Self {
            stride_x: 14,
            stride_y: 14,
        }
    }
}

impl ModelConfig {
    pub fn backend(&self) -> InferenceBackend {
        InferenceBackend::from_str_lossy(&self.backend)
    }
}

impl TilingConfig {
    pub fn strides(&self) -> Strides {
        Strides::new(self.stride_x, self.stride_y)
    }
}

impl AppConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config TOML: {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .context("config path does not have a parent directory")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory: {}", parent.display()))?;

        let encoded = toml::to_string_pretty(self).context("failed to serialize config TOML")?;
        fs::write(path, encoded)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn load() -> Result<Self> {
        Self::load_from_path(&config_file_path())
    }
}

/// Resolve the data directory, honoring `SRTILE_DATA_DIR`.
pub fn data_dir() -> PathBuf {
    match env::var(ENV_DATA_DIR) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("data"),
    }
}

pub fn config_file_path() -> PathBuf {
    data_dir().join(CONFIG_FILE_NAME)
}
