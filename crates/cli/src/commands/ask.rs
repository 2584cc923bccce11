//! Ask command handler.
//!
//! One-shot question answering: extract, index, retrieve, answer, print.

use crate::extract;
use askdoc_core::{config::AppConfig, AppResult};
use askdoc_retrieval::{RetrievalMode, SessionContext};
use clap::Args;
use std::path::PathBuf;

/// Ask a single question about a document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Document to question (plain text, form-feed page breaks)
    pub document: PathBuf,

    /// The question to ask
    pub question: String,

    /// Restrict retrieval to these pages (e.g., "2,4-6")
    #[arg(long, conflicts_with = "external")]
    pub pages: Option<String>,

    /// Answer from the model's own knowledge instead of the document
    #[arg(long)]
    pub external: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let pages = extract::extract_pages(&self.document)?;
        let engine = super::build_engine(config)?;

        let mut index = engine.build_index(pages).await?;
        let mut session = SessionContext::new();

        let mode = self.mode()?;
        let answer = engine
            .ask(&self.question, &mode, &mut index, &mut session)
            .await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer,
                "mode": mode_name(&mode),
                "document": self.document,
                "provider": config.provider,
                "model": config.model,
            });

            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| askdoc_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }

    /// Resolve the retrieval mode from the CLI flags.
    fn mode(&self) -> AppResult<RetrievalMode> {
        if self.external {
            return Ok(RetrievalMode::Bypass);
        }

        if let Some(ref selector) = self.pages {
            let subset = extract::parse_page_selector(selector)?;
            return Ok(RetrievalMode::PageScoped(subset));
        }

        Ok(RetrievalMode::FreshSearch)
    }
}

/// Stable mode name for JSON output.
pub(crate) fn mode_name(mode: &RetrievalMode) -> &'static str {
    match mode {
        RetrievalMode::FreshSearch => "fresh-search",
        RetrievalMode::Continuation => "continuation",
        RetrievalMode::PageScoped(_) => "page-scoped",
        RetrievalMode::Bypass => "bypass",
    }
}
