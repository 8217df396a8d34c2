use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quickfill_completion::*;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "quickfill")]
#[command(about = "Rank completions for a prefix from a source file and an optional backend")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a prefix against a source file
    Complete {
        /// Source file to index
        #[arg(short, long)]
        file: PathBuf,

        /// Prefix being typed
        #[arg(short, long)]
        prefix: String,

        /// Language tag; guessed from the file extension when omitted
        #[arg(short, long)]
        language: Option<String>,

        /// Also ask the remote backend
        #[arg(long)]
        connect: bool,

        /// How long to wait for the backend, in milliseconds
        #[arg(long, default_value_t = 3000)]
        wait_ms: u64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show indexed identifiers and their counts
    Index {
        /// Source file to index
        #[arg(short, long)]
        file: PathBuf,

        /// Only show identifiers with this prefix
        #[arg(short, long)]
        prefix: String,

        /// Language tag; guessed from the file extension when omitted
        #[arg(short, long)]
        language: Option<String>,
    },
}

struct LogObserver;

impl ConnectionObserver for LogObserver {
    fn connection_changed(&self, connected: bool) {
        info!(connected, "Backend connection status changed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CompletionConfig::default(),
    };

    match cli.command {
        Commands::Complete {
            file,
            prefix,
            language,
            connect,
            wait_ms,
            json,
        } => {
            let language = resolve_language(&file, language.as_deref());
            let source = read_source(&file)?;
            let suggestions = run_complete(
                config,
                &source,
                &prefix,
                language,
                connect,
                Duration::from_millis(wait_ms),
            )
            .await?;
            print_suggestions(&suggestions, json)?;
        }
        Commands::Index {
            file,
            prefix,
            language,
        } => {
            let language = resolve_language(&file, language.as_deref());
            let source = read_source(&file)?;
            let index = IdentifierTokenizer::new().build_index(&source, language);
            for (word, count) in index.query_with_counts(&prefix) {
                println!("{:>6}  {}", count, word);
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_language(file: &Path, tag: Option<&str>) -> Language {
    if let Some(tag) = tag {
        return Language::from_tag(tag);
    }
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("java") => Language::Java,
        Some("py") => Language::Python,
        _ => Language::Cpp,
    }
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

async fn run_complete(
    config: CompletionConfig,
    source: &str,
    prefix: &str,
    language: Language,
    connect: bool,
    wait: Duration,
) -> anyhow::Result<Vec<Suggestion>> {
    let mut engine = CompletionEngine::new(config.clone())?;

    if connect {
        let client = RemoteSuggestionClient::from_config(
            &config,
            Arc::new(WebSocketConnector),
            Arc::new(LogObserver),
        );
        client.connect();

        let mut phase = client.subscribe();
        let opened = matches!(
            tokio::time::timeout(wait, phase.wait_for(|p| p.is_open() || p.is_terminal())).await,
            Ok(Ok(ref p)) if p.is_open()
        );
        if !opened {
            warn!(endpoint = %config.endpoint, "Backend not reachable, using local suggestions only");
        }
        engine = engine.with_remote(client);
    }

    engine.reindex(source, language).await;

    let mut batch = engine.remote().map(|remote| {
        let mut batch = remote.subscribe_batch();
        batch.borrow_and_update();
        batch
    });

    // The first pass sends the query; its answer lands in the batch later
    let mut suggestions = engine.complete(prefix, language).await;
    let queried = engine.remote().map_or(false, |remote| remote.is_connected());
    if let Some(batch) = batch.as_mut().filter(|_| queried) {
        if tokio::time::timeout(wait, batch.changed()).await.is_ok() {
            suggestions = engine.complete(prefix, language).await;
        }
    }

    engine.shutdown().await;
    Ok(suggestions)
}

fn print_suggestions(suggestions: &[Suggestion], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No suggestions");
        return Ok(());
    }
    for suggestion in suggestions {
        println!(
            "{:<24} {:<10} {:>3}  {}",
            suggestion.text,
            suggestion.source_kind.label(),
            suggestion.priority,
            suggestion.description
        );
    }
    Ok(())
}
