use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub worker: WorkerConfig,
    pub host: HostConfig,
    pub encode: EncodeConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub target_width: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: 2000.0,
            min_scale: 1.0,
            max_scale: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub src: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            src: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    pub origin: String,
    pub base_path: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            base_path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EncodeConfig {
    pub blob_api: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self { blob_api: true }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let defaults = RenderConfig::default();
        if !self.render.target_width.is_finite() || self.render.target_width < 1.0 {
            self.render.target_width = defaults.target_width;
        }
        if !self.render.min_scale.is_finite() || self.render.min_scale <= 0.0 {
            self.render.min_scale = defaults.min_scale;
        }
        if !self.render.max_scale.is_finite() || self.render.max_scale < self.render.min_scale {
            self.render.max_scale = defaults.max_scale.max(self.render.min_scale);
        }
        if self.log.filter.trim().is_empty() {
            self.log.filter = LogConfig::default().filter;
        }
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("RPV_CONFIG_PATH")
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("rpv").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("rpv")
                .join("config.toml"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("rpv").join("config.toml"));
    }
    None
}
