// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::cache::CacheConfig;
use crate::constants::{
    DEFAULT_ADDRESS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_PORT,
    DEFAULT_QUALITY, DEFAULT_THREADS, DEFAULT_WEBP_QUALITY_CORRECTION, MAX_QUALITY, MIN_QUALITY,
};
use crate::plan::PlanSettings;
use crate::preset::PresetStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub image: ImageConfig,
    /// Preset name → directive string, e.g. `thumb: "rc150x150,q70"`
    #[serde(default)]
    pub presets: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            threads: default_threads(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `shashin=debug,pingora=warn`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Where source and watermark assets live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Local(LocalStorageConfig),
    S3(S3StorageConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalStorageConfig {
    pub base_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// Transform defaults and limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageConfig {
    #[serde(default = "default_quality")]
    pub default_quality: u8,
    #[serde(default = "default_webp_quality_correction")]
    pub webp_quality_correction: i8,
    /// Serve WebP to clients whose Accept header lists it
    #[serde(default = "default_true")]
    pub auto_webp: bool,
    /// Reject every directive other than preset references
    #[serde(default)]
    pub presets_only: bool,
    #[serde(default)]
    pub allow_upscale: bool,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            webp_quality_correction: default_webp_quality_correction(),
            auto_webp: true,
            presets_only: false,
            allow_upscale: false,
            max_width: default_max_width(),
            max_height: default_max_height(),
        }
    }
}

impl ImageConfig {
    pub fn plan_settings(&self) -> PlanSettings {
        PlanSettings {
            default_quality: self.default_quality,
            webp_quality_correction: self.webp_quality_correction,
            presets_only: self.presets_only,
            allow_upscale: self.allow_upscale,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_webp_quality_correction() -> i8 {
    DEFAULT_WEBP_QUALITY_CORRECTION
}

fn default_true() -> bool {
    true
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.address.trim().is_empty() {
            return Err("server.address cannot be empty".to_string());
        }
        if self.server.threads == 0 {
            return Err("server.threads must be at least 1".to_string());
        }

        match &self.storage {
            StorageConfig::Local(local) => {
                if local.base_dir.trim().is_empty() {
                    return Err("storage.base_dir cannot be empty".to_string());
                }
            }
            StorageConfig::S3(s3) => {
                if s3.bucket.trim().is_empty() {
                    return Err("storage.bucket cannot be empty".to_string());
                }
                if s3.region.trim().is_empty() {
                    return Err("storage.region cannot be empty".to_string());
                }
                if s3.access_key.is_some() != s3.secret_key.is_some() {
                    return Err(
                        "storage.access_key and storage.secret_key must be set together"
                            .to_string(),
                    );
                }
            }
        }

        self.cache.validate()?;

        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.image.default_quality) {
            return Err(format!(
                "image.default_quality must be between {} and {}, got {}",
                MIN_QUALITY, MAX_QUALITY, self.image.default_quality
            ));
        }
        if self.image.max_width == 0 || self.image.max_height == 0 {
            return Err("image.max_width and image.max_height must be positive".to_string());
        }

        PresetStore::from_definitions(&self.presets)?;

        Ok(())
    }

    /// Build the preset store from the `presets` section
    pub fn preset_store(&self) -> Result<PresetStore, String> {
        PresetStore::from_definitions(&self.presets)
    }
}
