/// QuickFill Completion Engine
///
/// An incremental code-completion engine that ranks candidates from three
/// sources: identifiers already present in the buffer, a static per-language
/// snippet catalog, and suggestions pushed by a remote backend over a
/// persistent WebSocket connection.
///
/// # Architecture
///
/// 1. **Indexing**: [`IdentifierTokenizer`] splits the buffer into identifiers
///    and rebuilds a frequency-weighted [`PrefixIndex`] on a timer
/// 2. **Remote**: [`RemoteSuggestionClient`] keeps a connection to the backend
///    alive with a linear reconnect backoff and caches the latest batch
/// 3. **Merging**: [`SuggestionMerger`] deduplicates and ranks remote, local
///    and catalog candidates into one capped list
/// 4. **Orchestration**: [`CompletionEngine`] drives all of the above per edit
///
/// The remote connection is best-effort. When the backend is unreachable or
/// the retry budget is spent, completion continues with local and static
/// sources only.
///
/// # Connection lifecycle
///
/// The connection is an explicit [`ConnectionPhase`] advanced by the pure
/// [`ConnectionMachine`]. A background task turns channel events and tokio
/// timers into [`ConnectionEvent`]s and applies the resulting [`Effect`]s,
/// so the lifecycle can be tested against a paused clock.
///
/// # Configuration
///
/// [`CompletionConfig`] is loaded from YAML or JSON through [`ConfigLoader`]
/// and may replace the snippet table of any language.
///
/// # Example
///
/// ```ignore
/// use quickfill_completion::*;
/// use std::sync::Arc;
///
/// let config = CompletionConfig::default();
/// let client = RemoteSuggestionClient::from_config(
///     &config,
///     Arc::new(WebSocketConnector),
///     Arc::new(NoopObserver),
/// );
/// client.connect();
///
/// let engine = CompletionEngine::new(config)?.with_remote(client);
/// engine.reindex("std::vector<int> values;", Language::Cpp).await;
///
/// for suggestion in engine.complete_at("    val", Language::Cpp).await {
///     println!("{} [{}]", suggestion.text, suggestion.source_kind.label());
/// }
///
/// engine.shutdown().await;
/// ```
pub mod config;
pub mod engine;
pub mod language;
pub mod merger;
pub mod prefix_index;
pub mod remote;
pub mod snippets;
pub mod tokenizer;
pub mod types;

// Re-export public types and traits
pub use config::{CompletionConfig, ConfigFormat, ConfigLoader};
pub use engine::{extract_prefix, BufferSnapshot, BufferSource, CompletionEngine, SharedBuffer};
pub use language::Language;
pub use merger::SuggestionMerger;
pub use prefix_index::PrefixIndex;
pub use remote::{
    ChannelEvent, ConnectionEvent, ConnectionMachine, ConnectionObserver, ConnectionPhase,
    Connector, DuplexChannel, Effect, NoopObserver, ReconnectPolicy, RemoteEntry,
    RemoteSuggestionClient, WebSocketConnector,
};
pub use snippets::{SnippetCategory, SnippetEntry, StaticSnippetCatalog};
pub use tokenizer::IdentifierTokenizer;
pub use types::*;
