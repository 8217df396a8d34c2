/// Configuration loading and management for completion engine
use crate::language::Language;
use crate::snippets::{SnippetEntry, StaticSnippetCatalog};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "wss://codehelper-backend.onrender.com/ws";

/// Engine configuration, passed by value to the engine constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// WebSocket endpoint of the suggestion backend
    pub endpoint: String,
    /// Base reconnect delay; attempt `n` waits `n` times this
    pub reconnect_base_delay_ms: u64,
    pub connection_timeout_ms: u64,
    pub min_prefix_len: usize,
    pub max_suggestions: usize,
    /// How often the buffer is re-tokenized
    pub reindex_interval_ms: u64,
    pub max_reconnect_attempts: u32,
    /// Per-language replacement snippet tables
    pub snippets: HashMap<Language, Vec<SnippetEntry>>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_base_delay_ms: 5_000,
            connection_timeout_ms: 45_000,
            min_prefix_len: 2,
            max_suggestions: 10,
            reindex_interval_ms: 2_000,
            max_reconnect_attempts: 5,
            snippets: HashMap::new(),
        }
    }
}

impl CompletionConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn reindex_interval(&self) -> Duration {
        Duration::from_millis(self.reindex_interval_ms)
    }

    /// Built-in snippet catalog with this config's overrides applied
    pub fn snippet_catalog(&self) -> StaticSnippetCatalog {
        StaticSnippetCatalog::builtin().with_overrides(self.snippets.clone())
    }
}

/// Completion configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load completion configuration from a YAML file
    pub fn load_from_yaml(path: &Path) -> CompletionResult<CompletionConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Yaml)
    }

    /// Load completion configuration from a JSON file
    pub fn load_from_json(path: &Path) -> CompletionResult<CompletionConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Json)
    }

    /// Load a file, choosing the format from its extension
    pub fn load_from_path(path: &Path) -> CompletionResult<CompletionConfig> {
        match ConfigFormat::from_path(path) {
            Some(ConfigFormat::Yaml) => Self::load_from_yaml(path),
            Some(ConfigFormat::Json) => Self::load_from_json(path),
            None => Err(CompletionError::ConfigError(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }

    /// Load completion configuration from a string
    pub fn load_from_string(
        content: &str,
        format: ConfigFormat,
    ) -> CompletionResult<CompletionConfig> {
        let config = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Validate completion configuration
    pub fn validate_config(config: &CompletionConfig) -> CompletionResult<()> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(CompletionError::ConfigError(
                "Endpoint cannot be empty".to_string(),
            ));
        }

        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(CompletionError::ConfigError(format!(
                "Endpoint must use ws:// or wss://, got {}",
                endpoint
            )));
        }

        if config.reconnect_base_delay_ms == 0
            || config.connection_timeout_ms == 0
            || config.reindex_interval_ms == 0
        {
            return Err(CompletionError::ConfigError(
                "Durations must be greater than zero".to_string(),
            ));
        }

        if config.max_suggestions == 0 {
            return Err(CompletionError::ConfigError(
                "max_suggestions must be at least 1".to_string(),
            ));
        }

        if config.min_prefix_len == 0 {
            return Err(CompletionError::ConfigError(
                "min_prefix_len must be at least 1".to_string(),
            ));
        }

        for (language, entries) in &config.snippets {
            if let Some(entry) = entries.iter().find(|e| e.token.is_empty()) {
                return Err(CompletionError::ConfigError(format!(
                    "Snippet for {} has an empty token ({})",
                    language, entry.description
                )));
            }
        }

        Ok(())
    }
}

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}
