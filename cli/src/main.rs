//! CLI entrypoint for chatline
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chatline_application::{
    ChatConfig, ConversationLogger, HistoryStore, KeyValueStore, NoConversationLogger,
    SendLifecycleController, SendOutcome,
};
use chatline_domain::SessionId;
use chatline_infrastructure::{
    ConfigLoader, FileConfig, FileKeyValueStore, HttpChatEndpoint, JsonlConversationLogger,
    MemoryKeyValueStore,
};
use chatline_presentation::{ChatRepl, Cli, ReplConfig, TypingIndicator};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // CLI flags take precedence over every config source
    if let Some(url) = &cli.endpoint {
        config.endpoint.url = url.clone();
    }
    if cli.ephemeral {
        config.history.ephemeral = true;
    }
    config.validate()?;

    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;

    info!("Starting chatline (endpoint: {})", config.endpoint.url);

    // === Dependency Injection ===
    let conversation_logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let history = HistoryStore::new(build_store(&config)?)
        .with_conversation_logger(conversation_logger.clone());

    let endpoint = Arc::new(
        HttpChatEndpoint::new(config.endpoint.url.clone())
            .with_fallback_reply(config.chat.fallback_reply.clone()),
    );

    let session_id = match &cli.session {
        Some(id) => SessionId::parse(id.as_str())?,
        None => SessionId::generate(),
    };
    info!("Session: {}", session_id);

    let chat_config: ChatConfig = config.to_chat_config();
    let progress = Arc::new(
        TypingIndicator::new(chat_config.labels.clone())
            .with_spinner(!cli.quiet)
            .with_user_echo(cli.message.is_none()),
    );

    let controller = SendLifecycleController::new(endpoint, history, chat_config, session_id)
        .with_progress(progress)
        .with_conversation_logger(conversation_logger);

    let repl = ChatRepl::new(
        Arc::new(controller),
        ReplConfig::default()
            .with_long_message_chars(config.chat.long_message_chars)
            .with_export_dir(config.export_dir()),
    );

    // One-shot mode
    if let Some(message) = &cli.message {
        let outcome = repl.send_quick(message).await;
        repl.finish().await;
        return match outcome {
            SendOutcome::Replied { .. } => Ok(()),
            SendOutcome::Failed { .. } => bail!("The chat service did not answer"),
            SendOutcome::Ignored => bail!("Message is empty"),
            SendOutcome::Rejected => bail!("Another message is still being sent"),
        };
    }

    repl.run().await?;
    Ok(())
}

/// Install the tracing subscriber. Logs go to `log_file` when set, otherwise
/// to stderr. The returned guard must live until exit so buffered lines are
/// written.
fn init_logging(verbose: u8, log_file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file.map(Path::new) else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("logging.file has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// Pick the history backend: memory for ephemeral sessions, files otherwise
fn build_store(config: &FileConfig) -> Result<Arc<dyn KeyValueStore>> {
    if config.history.ephemeral {
        let store = match config.history.max_bytes {
            Some(limit) => MemoryKeyValueStore::with_quota_bytes(limit),
            None => MemoryKeyValueStore::new(),
        };
        return Ok(Arc::new(store));
    }

    let dir = config
        .history_dir()
        .context("No data directory available; set history.dir or use --ephemeral")?;
    info!("History directory: {}", dir.display());

    let mut store = FileKeyValueStore::new(dir);
    if let Some(limit) = config.history.max_bytes {
        store = store.with_max_value_bytes(limit);
    }
    Ok(Arc::new(store))
}
