//! The explicit context object threaded through every operation.

use chrono::{DateTime, Utc};

use super::context::QueryContext;
use super::model::{Affordance, ChatTurn, Session};
use crate::error::{ErpaError, Result};
use crate::workflow::PendingExtraction;

/// Transient message shown outside the transcript (e.g. "server unreachable").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Typing indicator with nested show/hide.
///
/// Message submission and workflow affordances may overlap, so the
/// indicator stays visible until every `show` has been matched by a `hide`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingIndicator {
    depth: u32,
}

impl TypingIndicator {
    pub fn show(&mut self) {
        self.depth += 1;
    }

    pub fn hide(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn is_visible(&self) -> bool {
        self.depth > 0
    }
}

/// All mutable chat state for one user.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    session: Session,
    query_context: Option<QueryContext>,
    busy: bool,
    pub typing: TypingIndicator,
    transcript: Vec<ChatTurn>,
    notices: Vec<Notice>,
    pending_extraction: Option<PendingExtraction>,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Starts a fresh conversation. Server-side history is left alone.
    pub fn new_chat(&mut self) {
        self.session = Session::new();
        self.transcript.clear();
        self.query_context = None;
        self.pending_extraction = None;
        tracing::info!(target: "session", "[ChatContext] New chat {}", self.session.id);
    }

    /// Claims the in-flight slot for a submitted message.
    pub fn begin_request(&mut self) -> Result<()> {
        if self.busy {
            return Err(ErpaError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    pub fn end_request(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn append_turn(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn last_turn(&self) -> Option<&ChatTurn> {
        self.transcript.last()
    }

    pub fn last_turn_mut(&mut self) -> Option<&mut ChatTurn> {
        self.transcript.last_mut()
    }

    /// Affordances of the most recent turn that offers any.
    pub fn latest_affordances(&self) -> &[Affordance] {
        self.transcript
            .iter()
            .rev()
            .find(|turn| !turn.affordances.is_empty())
            .map(|turn| turn.affordances.as_slice())
            .unwrap_or_default()
    }

    pub fn query_context(&self) -> Option<&QueryContext> {
        self.query_context.as_ref()
    }

    pub fn set_query_context(&mut self, context: QueryContext) {
        tracing::debug!(
            target: "session",
            "[ChatContext] Query context: {} x{}",
            context.doctype,
            context.count
        );
        self.query_context = Some(context);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        tracing::warn!(target: "session", "[ChatContext] Notice: {}", notice.message);
        self.notices.push(notice);
    }

    /// Returns and clears the pending notices.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn pending_extraction(&self) -> Option<&PendingExtraction> {
        self.pending_extraction.as_ref()
    }

    pub fn pending_extraction_mut(&mut self) -> Option<&mut PendingExtraction> {
        self.pending_extraction.as_mut()
    }

    /// Marks an extraction as pending for the current session, replacing
    /// any earlier one.
    pub fn start_extraction(&mut self) {
        self.pending_extraction = Some(PendingExtraction::new(self.session.id.clone()));
    }

    pub fn clear_extraction(&mut self) {
        self.pending_extraction = None;
    }
}
