//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod model_list;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::model_list::list_models;
use crate::core::config::{Config, ConfigKey};
use crate::logging::init_tracing;
use crate::ui::chat_loop::{run_chat, ChatOptions};

#[derive(Parser)]
#[command(name = "l4m")]
#[command(version)]
#[command(about = "A terminal chat client for local Ollama models")]
#[command(
    long_about = "l4m is a full-screen terminal chat client for language models served by a \
local Ollama instance. Responses stream in as they are generated, and prompts can \
optionally be augmented with passages retrieved from a Chroma collection.\n\n\
Modes:\n\
  TYPING            Type your message; Enter sends, Alt+Enter inserts a newline\n\
  SUBMIT            Esc from typing; t types, s opens the sidebar, Enter sends, q quits\n\
  SIDEBAR           Up/Down or j/k to move, Enter to activate, Esc or t to leave\n\
  Ctrl+C            Quit from anywhere\n\n\
Commands:\n\
  /help             List commands and keys\n\
  /model [name]     Show or switch the model\n\
  /rag <query>      Send one query with retrieval\n\
  /clear            Clear the transcript\n\
  /log [file]       Toggle or start the transcript log\n\n\
Diagnostics are written to a log file; set L4M_LOG (e.g. L4M_LOG=debug) to change verbosity."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with (overrides default-model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append the transcript to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// Start with retrieval-augmented prompts enabled
    #[arg(long, global = true, conflicts_with = "no_rag")]
    pub rag: bool,

    /// Start with retrieval-augmented prompts disabled
    #[arg(long, global = true)]
    pub no_rag: bool,

    /// Base URL of the Ollama server (overrides ollama-url)
    #[arg(long, global = true, value_name = "URL")]
    pub ollama_url: Option<String>,
}

impl Args {
    fn rag_override(&self) -> Option<bool> {
        match (self.rag, self.no_rag) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List the models installed on the Ollama server
    Models,
    /// Set a configuration value, or print the configuration when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value for the key (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let log_path = init_tracing()?;
    debug!(?log_path, "tracing initialised");

    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let rag = args.rag_override();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            run_chat(ChatOptions {
                model: args.model,
                log: args.log,
                rag,
                ollama_url: args.ollama_url,
            })
            .await
        }
        Commands::Models => list_models(args.ollama_url).await,
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            let key: ConfigKey = key.parse()?;
            config.set_value(key, &value.join(" "))?;
            config.save()?;
            println!("Set {key} to: {}", config.describe(key));
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            let key: ConfigKey = key.parse()?;
            config.unset_value(key);
            config.save()?;
            println!("Unset {key} (now {})", config.describe(key));
            Ok(())
        }
    }
}
