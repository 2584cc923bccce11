//! Per-session conversation state.
//!
//! One [`SessionContext`] exists per user session and is owned
//! exclusively by it, so no locking is involved. It carries the
//! continuation state for follow-up questions plus the displayed chat
//! history; the history is presentation-only and is never fed back into
//! the synthesis prompt.

use crate::types::Retrieval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Canonical lowercase name for display and export.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One displayed conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Message author
    pub role: Role,

    /// Message text
    pub content: String,

    /// When the message was recorded
    pub at: DateTime<Utc>,
}

/// Mutable, session-lifetime state for one user session.
///
/// The default-chain and page-scoped continuation slots are independent:
/// a page-scoped question never disturbs the chunks a plain follow-up
/// would continue from.
#[derive(Debug, Default)]
pub struct SessionContext {
    last_retrieval: Option<Retrieval>,
    scoped_last_retrieval: Option<Retrieval>,
    active_pages: Option<BTreeSet<u32>>,
    turns: Vec<Turn>,
}

impl SessionContext {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all session state.
    pub fn reset(&mut self) {
        self.last_retrieval = None;
        self.scoped_last_retrieval = None;
        self.active_pages = None;
        self.turns.clear();

        tracing::debug!("Session context reset");
    }

    /// Append a message to the displayed conversation history.
    pub fn record_turn(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// The displayed conversation history, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Last retrieval of the default (whole-document) chain.
    pub fn last_retrieval(&self) -> Option<&Retrieval> {
        self.last_retrieval.as_ref()
    }

    /// Overwrite the default chain's continuation slot.
    pub fn set_last_retrieval(&mut self, retrieval: Retrieval) {
        self.last_retrieval = Some(retrieval);
    }

    /// Last retrieval of the page-scoped chain.
    pub fn scoped_last_retrieval(&self) -> Option<&Retrieval> {
        self.scoped_last_retrieval.as_ref()
    }

    /// Overwrite the page-scoped chain's continuation slot and record
    /// the subset it belongs to.
    pub fn set_scoped_last_retrieval(&mut self, pages: BTreeSet<u32>, retrieval: Retrieval) {
        self.active_pages = Some(pages);
        self.scoped_last_retrieval = Some(retrieval);
    }

    /// The page subset of the most recent page-scoped question, if the
    /// session is currently on the scoped chain.
    pub fn active_pages(&self) -> Option<&BTreeSet<u32>> {
        self.active_pages.as_ref()
    }

    /// Return to the default chain, keeping its continuation slot.
    pub fn clear_active_pages(&mut self) {
        self.active_pages = None;
    }
}
