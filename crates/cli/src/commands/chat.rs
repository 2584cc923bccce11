//! Chat command handler.
//!
//! A line-oriented REPL over one document: plain questions run a fresh
//! retrieval, slash commands select the other retrieval modes, reset the
//! session, and export the conversation to CSV.

use crate::extract;
use askdoc_core::{config::AppConfig, AppError, AppResult};
use askdoc_retrieval::{RetrievalMode, Role, SessionContext};
use clap::Args;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Delay between words of the typewriter display.
const TYPEWRITER_DELAY_MS: u64 = 40;

/// Chat interactively with a document
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Document to chat about (plain text, form-feed page breaks)
    pub document: PathBuf,

    /// Print answers at once instead of word by word
    #[arg(long)]
    pub plain: bool,
}

/// One parsed line of REPL input.
#[derive(Debug, PartialEq)]
enum ChatInput {
    Question(RetrievalMode, String),
    Reset,
    Export(Option<PathBuf>),
    Help,
    Quit,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let pages = extract::extract_pages(&self.document)?;
        let page_count = pages.len();
        let engine = super::build_engine(config)?;

        println!("Indexing {:?} ({} pages)...", self.document, page_count);
        let mut index = engine.build_index(pages).await?;
        let mut session = SessionContext::new();

        println!("Ready. Type a question, or /help for commands.");

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else { break };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let input = match parse_input(&line) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            match input {
                ChatInput::Quit => break,
                ChatInput::Help => print_help(),
                ChatInput::Reset => {
                    engine.reset(&mut session);
                    println!("Chat reset.");
                }
                ChatInput::Export(path) => {
                    let path = path.unwrap_or_else(|| default_export_path(&self.document));
                    match export_history(&session, &path) {
                        Ok(()) => {
                            println!("Exported chat history to {:?}.", path);
                            engine.reset(&mut session);
                        }
                        Err(e) => eprintln!("{}", e),
                    }
                }
                ChatInput::Question(mode, question) => {
                    session.record_turn(Role::User, &question);

                    match engine.ask(&question, &mode, &mut index, &mut session).await {
                        Ok(answer) => {
                            self.display_answer(&answer).await?;
                            session.record_turn(Role::Assistant, answer);
                        }
                        // The failed question leaves retrieval state
                        // untouched; the chat goes on
                        Err(e) => eprintln!("{}", e),
                    }
                }
            }
        }

        Ok(())
    }

    /// Print an answer, word by word unless --plain was given.
    async fn display_answer(&self, answer: &str) -> AppResult<()> {
        if self.plain {
            println!("{}", answer);
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        for word in answer.split_whitespace() {
            write!(stdout, "{} ", word)?;
            stdout.flush()?;
            tokio::time::sleep(std::time::Duration::from_millis(TYPEWRITER_DELAY_MS)).await;
        }
        writeln!(stdout)?;

        Ok(())
    }
}

/// Parse one REPL line into a chat input.
fn parse_input(line: &str) -> AppResult<ChatInput> {
    let line = line.trim();

    if !line.starts_with('/') {
        return Ok(ChatInput::Question(
            RetrievalMode::FreshSearch,
            line.to_string(),
        ));
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "/same" => {
            if rest.is_empty() {
                return Err(AppError::InvalidInput("usage: /same <question>".to_string()));
            }
            Ok(ChatInput::Question(
                RetrievalMode::Continuation,
                rest.to_string(),
            ))
        }
        "/pages" => {
            let (selector, question) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| {
                    AppError::InvalidInput("usage: /pages <selector> <question>".to_string())
                })?;
            let subset = extract::parse_page_selector(selector)?;
            Ok(ChatInput::Question(
                RetrievalMode::PageScoped(subset),
                question.trim().to_string(),
            ))
        }
        "/external" => {
            if rest.is_empty() {
                return Err(AppError::InvalidInput(
                    "usage: /external <question>".to_string(),
                ));
            }
            Ok(ChatInput::Question(RetrievalMode::Bypass, rest.to_string()))
        }
        "/reset" => Ok(ChatInput::Reset),
        "/export" => Ok(ChatInput::Export(if rest.is_empty() {
            None
        } else {
            Some(PathBuf::from(rest))
        })),
        "/help" => Ok(ChatInput::Help),
        "/quit" | "/exit" => Ok(ChatInput::Quit),
        other => Err(AppError::InvalidInput(format!(
            "unknown command '{}'; try /help",
            other
        ))),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <question>                 search the document and answer");
    println!("  /same <question>           keep the previous passages");
    println!("  /pages <sel> <question>    search only pages <sel>, e.g. 2,4-6");
    println!("  /external <question>       answer from the model's own knowledge");
    println!("  /reset                     clear the conversation");
    println!("  /export [path]             save the conversation as CSV and reset");
    println!("  /quit                      leave the chat");
}

/// Default CSV path next to the current directory, named after the document.
fn default_export_path(document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    PathBuf::from(format!("chat_history_with_{}.csv", stem))
}

/// Write the conversation as a single timestamped CSV row.
fn export_history(session: &SessionContext, path: &Path) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::Serialization(format!("Failed to open {:?}: {}", path, e)))?;

    writer
        .write_record(["Timestamp", "Chat"])
        .map_err(|e| AppError::Serialization(e.to_string()))?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let chat = session
        .turns()
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    writer
        .write_record([timestamp, chat])
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    writer.flush()?;

    tracing::info!("Exported {} turns to {:?}", session.turns().len(), path);

    Ok(())
}
