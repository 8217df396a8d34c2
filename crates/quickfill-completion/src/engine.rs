/// Completion orchestrator
///
/// The engine owns every other component and wires them together:
///
/// 1. **Indexing**: on a fixed interval the buffer is re-tokenized into a
///    fresh [`PrefixIndex`] which replaces the previous one wholesale
/// 2. **Completion**: on every edit the caret prefix fires a remote query,
///    then the cached remote batch, the index and the snippet catalog are
///    merged into one ranked list
/// 3. **Commit**: a chosen suggestion becomes a [`TextEdit`]
///
/// Remote answers arrive asynchronously. A completion only sees the batch
/// produced by some earlier query, which the merger re-filters by prefix.
///
/// # Example
///
/// ```ignore
/// use quickfill_completion::*;
///
/// let engine = CompletionEngine::new(CompletionConfig::default())?;
/// engine.reindex("int total = 0; total += 1;", Language::Cpp).await;
///
/// let suggestions = engine.complete("to", Language::Cpp).await;
/// assert_eq!(suggestions[0].text, "total");
/// ```
use crate::config::{CompletionConfig, ConfigLoader};
use crate::language::Language;
use crate::merger::SuggestionMerger;
use crate::prefix_index::PrefixIndex;
use crate::remote::{RemoteSuggestionClient, SuggestionBatch};
use crate::tokenizer::IdentifierTokenizer;
use crate::types::*;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

static CARET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_#:]+$").expect("caret prefix pattern is valid"));

/// Buffer contents at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferSnapshot {
    pub text: String,
    pub language: Language,
}

impl BufferSnapshot {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// Supplies the buffer to the periodic re-indexer
#[async_trait]
pub trait BufferSource: Send + Sync {
    /// Current buffer, or `None` when no editor is attached
    async fn snapshot(&self) -> CompletionResult<Option<BufferSnapshot>>;
}

/// In-memory buffer the host updates as the user types
#[derive(Debug, Default)]
pub struct SharedBuffer {
    inner: RwLock<Option<BufferSnapshot>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, text: impl Into<String>, language: Language) {
        *self.inner.write().await = Some(BufferSnapshot::new(text, language));
    }

    pub async fn detach(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl BufferSource for SharedBuffer {
    async fn snapshot(&self) -> CompletionResult<Option<BufferSnapshot>> {
        Ok(self.inner.read().await.clone())
    }
}

/// Trailing run of `[A-Za-z0-9_#:]` before the caret, empty if none
pub fn extract_prefix(text_before_caret: &str) -> &str {
    CARET_PREFIX
        .find(text_before_caret)
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// Completion engine over local, static and remote sources
pub struct CompletionEngine {
    config: CompletionConfig,
    tokenizer: IdentifierTokenizer,
    index: Arc<RwLock<PrefixIndex>>,
    merger: SuggestionMerger,
    client: Option<Arc<RemoteSuggestionClient>>,
    reindexer: Mutex<Option<JoinHandle<()>>>,
}

impl CompletionEngine {
    /// Create a local-only engine
    pub fn new(config: CompletionConfig) -> CompletionResult<Self> {
        ConfigLoader::validate_config(&config)?;

        let merger = SuggestionMerger::new(
            Arc::new(config.snippet_catalog()),
            config.max_suggestions,
        );
        Ok(Self {
            config,
            tokenizer: IdentifierTokenizer::new(),
            index: Arc::new(RwLock::new(PrefixIndex::new())),
            merger,
            client: None,
            reindexer: Mutex::new(None),
        })
    }

    /// Attach a remote client; the engine destroys it on shutdown
    pub fn with_remote(mut self, client: RemoteSuggestionClient) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn remote(&self) -> Option<&RemoteSuggestionClient> {
        self.client.as_deref()
    }

    /// Rebuild the index from `text`, replacing the previous one
    ///
    /// Returns the number of identifier occurrences indexed.
    pub async fn reindex(&self, text: &str, language: Language) -> usize {
        rebuild(&self.tokenizer, &self.index, text, language).await
    }

    /// Re-index `source` now and then every `reindex_interval`
    ///
    /// Replaces any re-indexer started earlier.
    pub async fn spawn_reindexer(&self, source: Arc<dyn BufferSource>) {
        let tokenizer = self.tokenizer;
        let index = Arc::clone(&self.index);
        let period = self.config.reindex_interval();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.snapshot().await {
                    Ok(Some(snapshot)) => {
                        rebuild(&tokenizer, &index, &snapshot.text, snapshot.language).await;
                    }
                    Ok(None) => debug!("No buffer attached, skipping re-index"),
                    Err(e) => warn!(error_type = e.error_type(), "Re-index failed: {}", e),
                }
            }
        });

        if let Some(previous) = self.reindexer.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Ranked suggestions for `prefix`
    ///
    /// Prefixes shorter than `min_prefix_len` yield nothing and send no
    /// query.
    pub async fn complete(&self, prefix: &str, language: Language) -> Vec<Suggestion> {
        if prefix.chars().count() < self.config.min_prefix_len {
            return Vec::new();
        }

        let batch = match &self.client {
            Some(client) => {
                if !client.query(prefix, language) {
                    debug!(prefix, "Remote backend unavailable, skipping query");
                }
                client.batch()
            }
            None => SuggestionBatch::default(),
        };

        let local_words = self.index.read().await.query(prefix);
        let suggestions = self
            .merger
            .merge(prefix, &batch, &local_words, language);

        debug!(
            prefix,
            language = %language,
            remote = batch.len(),
            local = local_words.len(),
            returned = suggestions.len(),
            "Completed prefix"
        );
        suggestions
    }

    /// Complete whatever identifier ends at the caret
    pub async fn complete_at(&self, text_before_caret: &str, language: Language) -> Vec<Suggestion> {
        self.complete(extract_prefix(text_before_caret), language)
            .await
    }

    /// Edit that splices `suggestion` over the typed `prefix`
    pub fn commit(&self, suggestion: &Suggestion, prefix: &str) -> TextEdit {
        info!(text = %suggestion.text, kind = suggestion.source_kind.label(), "Committed suggestion");
        TextEdit {
            replace_len: prefix.chars().count(),
            insert_text: suggestion.insert_text.clone(),
        }
    }

    /// Stop re-indexing, then tear down the remote client
    pub async fn shutdown(&self) {
        if let Some(handle) = self.reindexer.lock().await.take() {
            handle.abort();
        }
        if let Some(client) = &self.client {
            client.destroy().await;
        }
        info!("Completion engine shut down");
    }
}

impl Drop for CompletionEngine {
    fn drop(&mut self) {
        // The remote driver stops once its command sender is gone
        if let Some(handle) = self.reindexer.get_mut().take() {
            handle.abort();
        }
    }
}

async fn rebuild(
    tokenizer: &IdentifierTokenizer,
    index: &RwLock<PrefixIndex>,
    text: &str,
    language: Language,
) -> usize {
    let mut fresh = PrefixIndex::new();
    let inserted = tokenizer.extract_identifiers(text, language, &mut fresh);
    *index.write().await = fresh;
    inserted
}
