//! Document-extraction confirmation workflow types.
//!
//! The extracted fields live on the server. The client only remembers which
//! session has an extraction pending and where it stands.

use serde::{Deserialize, Serialize};

/// A user response to a pending extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowCommand {
    Confirm,
    Cancel,
    ShowData,
    /// Free-text edit such as "change customer to CUST-001".
    Modify(String),
}

impl WorkflowCommand {
    /// The three affordances offered after an extraction.
    pub fn affordances() -> [WorkflowCommand; 3] {
        [Self::Confirm, Self::Cancel, Self::ShowData]
    }

    /// Text sent as `user_message`.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::ShowData => "show data",
            Self::Modify(text) => text,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Confirm => "Confirm & create",
            Self::Cancel => "Cancel",
            Self::ShowData => "Show extracted data",
            Self::Modify(_) => "Apply changes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionState {
    Extracted,
    DataShown,
    Confirmed,
    Cancelled,
}

impl ExtractionState {
    /// State after a command the backend accepted.
    pub fn after(self, command: &WorkflowCommand) -> Self {
        if self.is_terminal() {
            return self;
        }
        match command {
            WorkflowCommand::Confirm => Self::Confirmed,
            WorkflowCommand::Cancel => Self::Cancelled,
            WorkflowCommand::ShowData => Self::DataShown,
            WorkflowCommand::Modify(_) => Self::Extracted,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

/// Marker for the one extraction a session may have pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExtraction {
    pub session_id: String,
    pub state: ExtractionState,
}

impl PendingExtraction {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: ExtractionState::Extracted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let state = ExtractionState::Extracted;
        assert_eq!(state.after(&WorkflowCommand::ShowData), ExtractionState::DataShown);
        assert_eq!(
            ExtractionState::DataShown.after(&WorkflowCommand::Confirm),
            ExtractionState::Confirmed
        );
        assert_eq!(state.after(&WorkflowCommand::Cancel), ExtractionState::Cancelled);
    }

    #[test]
    fn test_terminal_states_stay_put() {
        assert_eq!(
            ExtractionState::Confirmed.after(&WorkflowCommand::Cancel),
            ExtractionState::Confirmed
        );
        assert!(ExtractionState::Cancelled.is_terminal());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(WorkflowCommand::ShowData.user_message(), "show data");
        assert_eq!(
            WorkflowCommand::Modify("change item 1 qty to 20".into()).user_message(),
            "change item 1 qty to 20"
        );
    }
}
