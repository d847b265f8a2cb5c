use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pdf-chat", version, about = "Chat with a PDF through an OpenAI-compatible API")]
pub struct Cli {
    /// Directory holding the settings database (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat, optionally about a PDF
    Chat {
        /// PDF to load before the first message
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Overrides the stored API key and PDF_CHAT_API_KEY
        #[arg(long)]
        api_key: Option<String>,
        /// Wait for the whole reply instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Report whether a PDF looks like a blood-test report
    Classify {
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage stored settings (api_key, base_url, model)
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    List,
    Set { key: String, value: String },
    Delete { key: String },
}
