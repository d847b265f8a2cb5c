pub mod classifier;
pub mod cli;
pub mod commands;
pub mod context;
pub mod db;
pub mod doc_processor;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod session;

use clap::Parser;
use cli::{Cli, Command, SettingsAction};
use commands::{chat, document, settings};
use db::Database;
use error::ChatError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=info,pdf_chat_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn data_dir(cli_dir: Option<PathBuf>) -> Result<PathBuf, String> {
    cli_dir
        .or_else(|| dirs::data_dir().map(|d| d.join("pdf-chat")))
        .ok_or_else(|| "Could not determine a data directory; pass --data-dir".to_string())
}

pub async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing();

    let dir_override = cli.data_dir;
    let open_db = move || -> Result<Database, String> {
        let app_dir = data_dir(dir_override)?;
        Database::new(&app_dir).map_err(|e| e.to_string())
    };

    match cli.command {
        Command::Chat {
            pdf,
            api_key,
            no_stream,
        } => {
            let db = open_db()?;
            let env_key = std::env::var(chat::API_KEY_ENV).ok();
            let config = chat::resolve_provider(&db, api_key, env_key).map_err(|e| match e {
                ChatError::MissingCredential => format!(
                    "{} (run `pdf-chat settings set api_key <KEY>` or set {})",
                    e,
                    chat::API_KEY_ENV
                ),
                other => other.to_string(),
            })?;
            chat::run_chat(config, pdf, !no_stream).await
        }
        Command::Classify { file, json } => {
            let report = document::classify_file(&file)?;
            if json {
                let out = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
                println!("{}", out);
            } else {
                println!(
                    "{} ({}, {} pages): {}",
                    report.name,
                    report.size,
                    report.pages,
                    if report.is_medical { "medical report" } else { "general document" }
                );
                println!(
                    "matched {}/{} keywords: {}",
                    report.matched.len(),
                    report.threshold,
                    report.matched.join(", ")
                );
            }
            Ok(())
        }
        Command::Settings { action } => {
            let db = open_db()?;
            match action {
                SettingsAction::List => {
                    for (key, value) in settings::get_settings(&db)? {
                        println!("{} = {}", key, value);
                    }
                    Ok(())
                }
                SettingsAction::Set { key, value } => settings::set_setting(&db, &key, &value),
                SettingsAction::Delete { key } => {
                    if !settings::delete_setting(&db, &key)? {
                        println!("{} was not set", key);
                    }
                    Ok(())
                }
            }
        }
    }
}
