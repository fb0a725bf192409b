use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "chatmind")]
#[command(version)]
#[command(about = "Terminal client for the ChatMind chat and QA batch-testing backend")]
pub struct Args {
    /// Backend base URL (overrides config file and CHATMIND_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Send one message, or start an interactive session when MESSAGE is omitted
    Chat {
        message: Option<String>,
    },
    /// Print the conversation stored in the backend session
    History,
    /// Clear the backend conversation
    ClearHistory {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// List available models and mark the active one
    Models,
    /// Switch the active model
    SetModel {
        id: String,
    },
    /// Run a QA batch
    Test {
        /// Pipe-separated cases, one `question|expected` per line
        #[arg(long)]
        cases: Option<PathBuf>,

        /// CSV file with a `question` column and optional `expected` column
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Start from the built-in sample cases
        #[arg(long)]
        samples: bool,

        /// Write the raw results as JSON into the export directory
        #[arg(long)]
        export: bool,

        /// Also write an HTML report to this file
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Write the CSV template for test case import
    Template {
        /// Target directory (defaults to the configured export directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// One line typed into the interactive chat loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Message(String),
    Clear,
    Model(Option<String>),
    Quit,
    Empty,
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
        ("/quit" | "/exit", _) => ChatInput::Quit,
        ("/clear", _) => ChatInput::Clear,
        ("/model", rest) => {
            let rest = rest.trim();
            ChatInput::Model((!rest.is_empty()).then(|| rest.to_string()))
        }
        _ => ChatInput::Message(line.to_string()),
    }
}
