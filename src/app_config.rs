use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs;
use std::path::Path;

use crate::translation::prompts::templates::DEFAULT_STYLE;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TranslationConfig {
    /// Completion endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Engine settings shared by every provider
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Ollama endpoint settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Base URL of the server
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            temperature: default_temperature(),
        }
    }
}

/// Chunking, retry and prompt settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationCommonConfig {
    /// Cues per request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Context cues shown on each side of a chunk
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Additional attempts after the first failed call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Multiplier applied to the delay after each backoff
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Timeout of a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Chunks translated at the same time
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Prompt style name
    #[serde(default = "default_style")]
    pub style: String,

    /// Term to translation mapping the model must follow
    #[serde(default)]
    pub glossary: BTreeMap<String, String>,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            context_window: default_context_window(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrent_requests: default_concurrent_requests(),
            style: default_style(),
            glossary: BTreeMap::new(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_chunk_size() -> usize {
    10
}

fn default_context_window() -> usize {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl Config {
    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Read a configuration file, creating one with defaults if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.source_language)?;
        crate::language_utils::get_language_name(&self.target_language)?;

        let common = &self.translation.common;
        if common.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be at least 1"));
        }
        if common.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }
        if common.backoff_factor.is_nan() || common.backoff_factor < 1.0 {
            return Err(anyhow!("backoff_factor must be at least 1.0, got {}", common.backoff_factor));
        }
        if common.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }
        if common.style.trim().is_empty() {
            return Err(anyhow!("style must not be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
