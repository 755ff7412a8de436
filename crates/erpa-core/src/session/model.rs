//! Session and transcript types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionDescriptor;
use crate::markup::Markup;
use crate::workflow::WorkflowCommand;

/// The active conversation. Every outgoing request carries its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents the role of a turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Assistant,
}

/// Token accounting reported with a reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, alias = "input_tokens", alias = "prompt_tokens")]
    pub input: u64,
    #[serde(default, alias = "output_tokens", alias = "completion_tokens")]
    pub output: u64,
    #[serde(default, alias = "total_tokens")]
    pub total: u64,
}

/// Something the user can click on a rendered turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Affordance {
    /// Runs a suggested action once confirmed.
    RunAction {
        label: String,
        action: ActionDescriptor,
    },
    /// Answers a pending extraction.
    Workflow {
        command: WorkflowCommand,
        session_id: String,
    },
}

impl Affordance {
    pub fn run(action: ActionDescriptor) -> Self {
        Self::RunAction {
            label: action.action.label(),
            action,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::RunAction { label, .. } => label,
            Self::Workflow { command, .. } => command.label(),
        }
    }
}

/// One rendered entry in the transcript. Never mutated once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: Markup,
    pub token_usage: Option<TokenUsage>,
    pub affordances: Vec<Affordance>,
}

impl ChatTurn {
    /// A user turn; the text is escaped.
    pub fn user(text: &str) -> Self {
        Self {
            role: MessageRole::User,
            content: Markup::element("p", Markup::text(text)),
            token_usage: None,
            affordances: Vec::new(),
        }
    }

    pub fn assistant(content: Markup) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            token_usage: None,
            affordances: Vec::new(),
        }
    }

    /// An assistant turn reporting a failure, prefixed with the error marker.
    pub fn failure(message: &str) -> Self {
        let text = format!("{} {message}", crate::error::ERROR_MARKER);
        Self::assistant(Markup::element("p", Markup::text(&text)))
    }

    pub fn with_token_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.token_usage = usage;
        self
    }

    pub fn with_affordance(mut self, affordance: Affordance) -> Self {
        self.affordances.push(affordance);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.role == MessageRole::Assistant
            && self
                .content
                .to_plain_text()
                .starts_with(crate::error::ERROR_MARKER)
    }
}
