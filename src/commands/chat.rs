use crate::commands::document::{clear_document, load_document};
use crate::commands::settings::{API_KEY, BASE_URL, MODEL};
use crate::db::Database;
use crate::error::ChatError;
use crate::llm::openai::{OpenAiClient, OpenAiConfig};
use crate::llm::{ChatTransport, StreamChunk};
use crate::prompts::PROMPT_VERSION;
use crate::session::ChatSession;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

pub const API_KEY_ENV: &str = "PDF_CHAT_API_KEY";

/// Resolve the OpenAI-compatible endpoint from flag, environment and stored settings.
///
/// The API key comes from the first non-empty of `flag_key`, `env_key` and the
/// stored setting; base URL and model fall back to the OpenRouter defaults.
pub fn resolve_provider(
    db: &Database,
    flag_key: Option<String>,
    env_key: Option<String>,
) -> Result<OpenAiConfig, ChatError> {
    let stored_key = db.get_setting(API_KEY)?;
    let api_key = [flag_key, env_key, stored_key]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .ok_or(ChatError::MissingCredential)?;

    let mut config = OpenAiConfig::openrouter(api_key);
    if let Some(base_url) = db.get_setting(BASE_URL)? {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(model) = db.get_setting(MODEL)? {
        config.model = model;
    }
    Ok(config)
}

enum Input<'a> {
    Quit,
    Load(&'a str),
    Clear,
    Help,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.split_once(' ').unwrap_or((line, "")) {
        ("/quit" | "/exit", _) => Input::Quit,
        ("/load", path) => Input::Load(path.trim()),
        ("/clear", _) => Input::Clear,
        ("/help", _) => Input::Help,
        _ => Input::Message(line),
    }
}

const HELP: &str = "Commands: /load <file.pdf>, /clear, /quit. Anything else is sent as a message.";

/// Interactive chat loop on stdin/stdout.
pub async fn run_chat(
    config: OpenAiConfig,
    pdf: Option<PathBuf>,
    stream: bool,
) -> Result<(), String> {
    let client = OpenAiClient::new(config).map_err(|e| e.to_string())?;
    tracing::info!(
        model = client.model(),
        stream,
        prompt_version = PROMPT_VERSION,
        "starting chat"
    );

    let mut session = ChatSession::new();
    println!("{}", HELP);
    if let Some(path) = pdf {
        open_document(&mut session, &client, &path, stream).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? else {
            break;
        };
        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => println!("{}", HELP),
            Input::Clear => println!("{}", clear_document(&mut session)),
            Input::Load("") => println!("Usage: /load <file.pdf>"),
            Input::Load(path) => {
                open_document(&mut session, &client, Path::new(path), stream).await
            }
            Input::Message("") => {}
            Input::Message(text) => turn(&mut session, &client, text, stream).await,
        }
    }
    Ok(())
}

async fn open_document(
    session: &mut ChatSession,
    client: &dyn ChatTransport,
    path: &Path,
    stream: bool,
) {
    match load_document(session, path) {
        Ok(notice) => println!("{}", notice),
        Err(e) => {
            println!("Failed to process PDF: {}", e);
            return;
        }
    }

    if let Some(prompt) = session.take_auto_analysis() {
        println!("You: {}", prompt);
        turn(session, client, prompt, stream).await;
    }
}

async fn turn(
    session: &mut ChatSession,
    client: &dyn ChatTransport,
    content: &str,
    stream: bool,
) {
    let result = if stream {
        print!("Assistant: ");
        std::io::stdout().flush().ok();
        let print_chunk = |chunk: StreamChunk| {
            if chunk.done {
                println!();
            } else {
                print!("{}", chunk.delta);
                std::io::stdout().flush().ok();
            }
        };
        session.send_streaming(client, content, &print_chunk).await
    } else {
        session.send(client, content).await.inspect(|reply| {
            println!("Assistant: {}", reply.content);
        })
    };

    if let Err(e) = result {
        if stream {
            println!();
        }
        println!("Failed to get a response. Please try again. ({})", e);
    }
}
