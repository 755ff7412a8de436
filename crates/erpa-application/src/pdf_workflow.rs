//! Document-extraction confirmation workflow.
//!
//! After an upload the backend holds the extracted order and the client
//! only offers confirm / cancel / show-data. Each answer is one call to the
//! workflow endpoint keyed by the session id; repeated answers are always
//! forwarded.

use std::sync::Arc;

use erpa_core::backend::{Backend, BackendRequest, Endpoint, unwrap_envelope};
use erpa_core::error::{ErpaError, Result};
use erpa_core::markdown;
use erpa_core::markup::Markup;
use erpa_core::result::format;
use erpa_core::session::{Affordance, ChatContext, ChatTurn};
use erpa_core::workflow::WorkflowCommand;
use serde_json::{Map, Value, json};

use crate::outcome::report_error;

/// Drives the confirm / cancel / show-data exchange.
#[derive(Clone)]
pub struct PdfWorkflow {
    backend: Arc<dyn Backend>,
}

impl PdfWorkflow {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Workflow affordances for an extraction in `session_id`.
    pub fn affordances(session_id: &str) -> Vec<Affordance> {
        WorkflowCommand::affordances()
            .into_iter()
            .map(|command| Affordance::Workflow {
                command,
                session_id: session_id.to_string(),
            })
            .collect()
    }

    /// Sends one command and appends the reply to the transcript.
    ///
    /// The typing indicator is shown for the duration of the call and
    /// released whatever the outcome.
    pub async fn respond(&self, ctx: &mut ChatContext, command: WorkflowCommand, session_id: &str) {
        tracing::info!(
            target: "pdf_workflow",
            "[PdfWorkflow] '{}' for session {session_id}",
            command.user_message()
        );
        ctx.append_turn(ChatTurn::user(command.user_message()));

        ctx.typing.show();
        let reply = self.send(&command, session_id).await;
        ctx.typing.hide();

        match reply.and_then(|payload| reply_turn(&command, session_id, &payload)) {
            Ok((turn, accepted)) => {
                if accepted {
                    advance(ctx, &command, session_id, !turn.affordances.is_empty());
                }
                ctx.append_turn(turn);
            }
            Err(err) => report_error(ctx, &err),
        }
    }

    /// Asks the backend whether it still holds an extraction for the
    /// current session and restores the pending marker if so.
    pub async fn check_context(&self, ctx: &mut ChatContext) -> Result<bool> {
        let request = BackendRequest::new(Endpoint::CheckPdfContext)
            .param("conversation_id", json!(ctx.session_id()));
        let payload = unwrap_envelope(self.backend.call(request).await?)?;

        let has_context = payload
            .get("has_context")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if has_context && ctx.pending_extraction().is_none() {
            tracing::info!(
                target: "pdf_workflow",
                "[PdfWorkflow] Restored pending extraction for {}",
                ctx.session_id()
            );
            ctx.start_extraction();
        } else if !has_context {
            ctx.clear_extraction();
        }
        Ok(has_context)
    }

    async fn send(&self, command: &WorkflowCommand, session_id: &str) -> Result<Map<String, Value>> {
        let request = BackendRequest::new(Endpoint::PdfWorkflowRespond)
            .param("conversation_id", json!(session_id))
            .param("user_message", json!(command.user_message()));
        unwrap_envelope(self.backend.call(request).await?)
    }
}

/// Builds the assistant turn for a workflow reply. The flag is true when
/// the backend applied the command.
fn reply_turn(
    command: &WorkflowCommand,
    session_id: &str,
    payload: &Map<String, Value>,
) -> Result<(ChatTurn, bool)> {
    let status = payload.get("status").and_then(Value::as_str).unwrap_or("success");
    let message = ["message", "response"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .filter(|text| !text.trim().is_empty());

    if status == "error" {
        return Err(ErpaError::backend(message.unwrap_or_default()));
    }

    let confirmed = match command {
        WorkflowCommand::Confirm => format::extraction_confirmed(payload).map(|r| r.markup),
        _ => None,
    };
    let markup = match (confirmed, message) {
        (Some(markup), _) => markup,
        (None, Some(text)) => markdown::render(text),
        (None, None) => Markup::element_text("p", "The server returned no details."),
    };

    let mut turn = ChatTurn::assistant(markup);
    let still_pending = payload.get("requires_action").and_then(Value::as_bool) == Some(true);
    if still_pending {
        for affordance in PdfWorkflow::affordances(session_id) {
            turn = turn.with_affordance(affordance);
        }
    }
    Ok((turn, status == "success"))
}

fn advance(ctx: &mut ChatContext, command: &WorkflowCommand, session_id: &str, still_pending: bool) {
    if ctx.pending_extraction().is_none() && still_pending && session_id == ctx.session_id() {
        ctx.start_extraction();
    }
    let Some(pending) = ctx.pending_extraction_mut() else {
        return;
    };
    if pending.session_id != session_id {
        return;
    }
    pending.state = pending.state.after(command);
    if pending.state.is_terminal() {
        tracing::info!(
            target: "pdf_workflow",
            "[PdfWorkflow] Extraction for {session_id} finished: {:?}",
            pending.state
        );
        ctx.clear_extraction();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_confirm_reply_summarises_order() {
        let payload = object(json!({
            "status": "success",
            "message": "Sales order created",
            "sales_order_name": "SO-0007",
            "requires_action": false
        }));
        let (turn, accepted) = reply_turn(&WorkflowCommand::Confirm, "s1", &payload).unwrap();
        assert!(accepted);
        assert!(turn.content.as_str().contains("SO-0007"));
        assert!(turn.affordances.is_empty());
    }

    #[test]
    fn test_show_data_keeps_affordances() {
        let payload = object(json!({
            "status": "success",
            "message": "**Customer:** Acme",
            "requires_action": true
        }));
        let (turn, _) = reply_turn(&WorkflowCommand::ShowData, "s1", &payload).unwrap();
        assert_eq!(turn.content.as_str(), "<p><strong>Customer:</strong> Acme</p>");
        assert_eq!(turn.affordances.len(), 3);
    }

    #[test]
    fn test_info_status_is_shown_but_not_applied() {
        let payload = object(json!({"status": "info", "message": "Say confirm or cancel."}));
        let (turn, accepted) = reply_turn(&WorkflowCommand::Modify("hm".into()), "s1", &payload)
            .unwrap();
        assert!(!accepted);
        assert!(!turn.is_failure());
    }

    #[test]
    fn test_error_status_uses_backend_message() {
        let payload = object(json!({
            "status": "error",
            "message": "No active PDF session found. Please upload a PDF first."
        }));
        let err = reply_turn(&WorkflowCommand::Confirm, "s1", &payload).unwrap_err();
        assert_eq!(
            err,
            ErpaError::backend("No active PDF session found. Please upload a PDF first.")
        );
    }
}
