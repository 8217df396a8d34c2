//! Core data types shared by the completion pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Errors that can occur inside the completion engine
///
/// None of these ever reach the editor collaborator: the orchestrator logs
/// them and degrades to an empty suggestion list for the current cycle.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout after {0}ms")]
    TimeoutError(u64),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Client is not connected")]
    NotConnected,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CompletionError {
    /// Gets the error type for logging
    pub fn error_type(&self) -> &'static str {
        match self {
            CompletionError::ConfigError(_) => "ConfigError",
            CompletionError::ConnectionError(_) => "ConnectionError",
            CompletionError::TimeoutError(_) => "TimeoutError",
            CompletionError::ProtocolError(_) => "ProtocolError",
            CompletionError::NotConnected => "NotConnected",
            CompletionError::SerializationError(_) => "SerializationError",
            CompletionError::YamlError(_) => "YamlError",
            CompletionError::IoError(_) => "IoError",
            CompletionError::InternalError(_) => "InternalError",
        }
    }

    /// Whether the reconnect machinery can recover from this error
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CompletionError::ConnectionError(_)
                | CompletionError::TimeoutError(_)
                | CompletionError::NotConnected
        )
    }
}

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Delivered by the remote suggestion backend
    Remote,
    /// Identifier already present in the buffer
    Local,
    /// Standard library container or type
    SnippetStl,
    /// Standard algorithm call
    SnippetAlgo,
    /// Control-flow template
    SnippetControl,
    /// Include / import line
    SnippetInclude,
    /// Library class instantiation
    SnippetClass,
    Keyword,
}

impl SourceKind {
    /// Short badge shown next to the suggestion
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Remote => "Smart",
            SourceKind::Local => "Local",
            SourceKind::SnippetStl => "STL",
            SourceKind::SnippetAlgo => "Algorithm",
            SourceKind::SnippetControl => "Snippet",
            SourceKind::SnippetInclude => "Include",
            SourceKind::SnippetClass => "Class",
            SourceKind::Keyword => "Keyword",
        }
    }

    pub fn is_snippet(&self) -> bool {
        matches!(
            self,
            SourceKind::SnippetStl
                | SourceKind::SnippetAlgo
                | SourceKind::SnippetControl
                | SourceKind::SnippetInclude
                | SourceKind::SnippetClass
        )
    }
}

/// A single ranked completion candidate
///
/// Suggestions carry no identity beyond their fields; the merger
/// deduplicates on `text` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// The completion token matched against the prefix
    pub text: String,
    /// Display string
    pub description: String,
    /// Text spliced into the buffer in place of the prefix
    pub insert_text: String,
    /// Origin of the suggestion
    pub source_kind: SourceKind,
    /// Higher wins
    pub priority: i32,
}

impl Suggestion {
    /// Create a suggestion whose description and insert text equal its token
    pub fn plain(text: impl Into<String>, source_kind: SourceKind, priority: i32) -> Self {
        let text = text.into();
        Self {
            description: text.clone(),
            insert_text: text.clone(),
            text,
            source_kind,
            priority,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_insert_text(mut self, insert_text: impl Into<String>) -> Self {
        self.insert_text = insert_text.into();
        self
    }
}

/// Edit the editor collaborator applies when a suggestion is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Number of characters before the caret to replace
    pub replace_len: usize,
    /// Replacement text
    pub insert_text: String,
}
