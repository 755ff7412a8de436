//! Mapping of failures to what the user sees.

use erpa_core::error::ErpaError;
use erpa_core::session::{ChatContext, ChatTurn, Notice};

/// Where a failure ends up.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An assistant turn prefixed with the error marker.
    Turn(ChatTurn),
    /// A transient notice outside the transcript.
    Notice(Notice),
}

impl Outcome {
    /// Connectivity failures become notices; everything else a failure turn.
    pub fn from_error(err: &ErpaError) -> Self {
        if err.is_connectivity() {
            Self::Notice(Notice::new(err.user_message()))
        } else {
            Self::Turn(ChatTurn::failure(&err.user_message()))
        }
    }

    pub fn apply(self, ctx: &mut ChatContext) {
        match self {
            Self::Turn(turn) => ctx.append_turn(turn),
            Self::Notice(notice) => ctx.push_notice(notice),
        }
    }
}

/// Logs a failure with its full detail and reports it to the user.
pub fn report_error(ctx: &mut ChatContext, err: &ErpaError) {
    match err {
        ErpaError::Transport { .. } | ErpaError::Connectivity(_) => {
            tracing::error!(target: "dispatch", "[Outcome] {err}");
        }
        ErpaError::UnknownAction(_) | ErpaError::MalformedPayload(_) => {
            tracing::warn!(target: "dispatch", "[Outcome] {err}");
        }
        _ => tracing::info!(target: "dispatch", "[Outcome] {err}"),
    }
    Outcome::from_error(err).apply(ctx);
}
