//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chatline
#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(author, version, about = "Terminal client for a JSON chat endpoint")]
#[command(long_about = r#"
Chatline sends your messages to a chat service over HTTP and keeps the
conversation history on disk, keyed by session id.

Run without a message to start an interactive session. Keys:
  Enter         Send
  Shift+Enter   New line
  Esc           Close an open menu
  Ctrl+K        Back to the input line
  Ctrl+L        Clear the conversation (asks first)
  Ctrl+S        Export the conversation as a text file

Configuration files are loaded from (in priority order):
1. CHATLINE_<SECTION>__<KEY>        Environment
2. --config <path>                  Explicit config file
3. ./chatline.toml                  Project-level config
4. ~/.config/chatline/config.toml   Global config

Example:
  chatline "What zoning applies to my parcel?"
  chatline --session session_1700000000000_abc123xyz
  chatline --endpoint http://localhost:5000/chat --ephemeral
"#)]
pub struct Cli {
    /// Send one message, print the reply and exit
    pub message: Option<String>,

    /// Resume an existing session id instead of starting a new one
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// Chat endpoint URL (overrides endpoint.url)
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Keep history in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the typing indicator
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
