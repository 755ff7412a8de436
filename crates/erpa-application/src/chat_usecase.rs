//! Chat use case implementation.
//!
//! This module provides the `ChatUseCase`, which sends user messages to the
//! assistant, interprets each reply and routes suggested actions to the
//! [`ActionDispatcher`] and extraction replies to the [`PdfWorkflow`].

use std::sync::Arc;

use erpa_core::action::{Resolution, interpret};
use erpa_core::backend::{
    Attachment, Backend, BackendRequest, Endpoint, check_status, unwrap_envelope,
};
use erpa_core::config::ClientConfig;
use erpa_core::error::{ErpaError, Result};
use erpa_core::markdown;
use erpa_core::markup::Markup;
use erpa_core::result::render_result;
use erpa_core::session::{Affordance, ChatContext, ChatTurn, Notice, TokenUsage};
use erpa_core::workflow::WorkflowCommand;
use serde_json::{Map, Value, json};

use crate::handlers::ActionDispatcher;
use crate::outcome::report_error;
use crate::pdf_workflow::PdfWorkflow;

const EMPTY_REPLY: &str = "The assistant returned an empty reply.";

/// Use case for one user's conversation with the assistant.
///
/// # Responsibilities
///
/// - Guarding against a second message while one is in flight
/// - Appending the user turn before the request and the reply after it
/// - Running immediate actions and offering suggested ones
/// - Entering the extraction workflow when a reply asks for confirmation
#[derive(Clone)]
pub struct ChatUseCase {
    backend: Arc<dyn Backend>,
    dispatcher: ActionDispatcher,
    workflow: PdfWorkflow,
}

impl ChatUseCase {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            dispatcher: ActionDispatcher::new(backend.clone()),
            workflow: PdfWorkflow::new(backend.clone()),
            backend,
        }
    }

    /// Applies client settings that affect requests.
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.dispatcher = self.dispatcher.with_default_limit(config.default_limit);
        self
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn workflow(&self) -> &PdfWorkflow {
        &self.workflow
    }

    /// Sends a message (and optional file) and processes the reply.
    ///
    /// # Errors
    ///
    /// - `Validation`: neither text nor an attachment was given
    /// - `Busy`: another message is still being processed
    ///
    /// All other failures are reported in the transcript or as notices.
    pub async fn submit_message(
        &self,
        ctx: &mut ChatContext,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<()> {
        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            return Err(ErpaError::validation("Please provide a message or a file."));
        }
        ctx.begin_request()?;

        ctx.append_turn(ChatTurn::user(&user_text(text, attachment.as_ref())));

        ctx.typing.show();
        let reply = self.send(ctx.session_id(), text, attachment).await;
        ctx.typing.hide();

        match reply {
            Ok(payload) => self.handle_reply(ctx, &payload).await,
            Err(err) => report_error(ctx, &err),
        }

        ctx.end_request();
        Ok(())
    }

    /// Triggers an affordance from an earlier turn. Not subject to the
    /// in-flight guard; every invocation is a fresh backend call.
    pub async fn invoke_affordance(&self, ctx: &mut ChatContext, affordance: &Affordance) {
        match affordance {
            Affordance::RunAction { action, .. } => self.dispatcher.dispatch(ctx, action).await,
            Affordance::Workflow {
                command,
                session_id,
            } => {
                self.workflow
                    .respond(ctx, command.clone(), session_id)
                    .await
            }
        }
    }

    /// Answers the pending extraction, or the current session's one when
    /// the client lost track of it.
    pub async fn respond_to_extraction(&self, ctx: &mut ChatContext, command: WorkflowCommand) {
        let session_id = ctx
            .pending_extraction()
            .map(|pending| pending.session_id.clone())
            .unwrap_or_else(|| ctx.session_id().to_string());
        self.workflow.respond(ctx, command, &session_id).await;
    }

    /// Starts a new chat locally. Server history is kept.
    pub fn new_chat(&self, ctx: &mut ChatContext) {
        ctx.new_chat();
    }

    /// Clears the server-side history of the current session, then starts a
    /// new chat.
    pub async fn clear_history(&self, ctx: &mut ChatContext) {
        let request = BackendRequest::new(Endpoint::ClearHistory)
            .param("session_id", json!(ctx.session_id()));
        let result = match self.backend.call(request).await {
            Ok(body) => unwrap_envelope(body).and_then(|payload| check_status(&payload)),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                ctx.new_chat();
                ctx.push_notice(Notice::new("Conversation history cleared."));
            }
            Err(err) => report_error(ctx, &err),
        }
    }

    async fn send(
        &self,
        session_id: &str,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<Map<String, Value>> {
        let mut request = BackendRequest::new(Endpoint::SendMessage)
            .param("message", (!text.is_empty()).then(|| json!(text)))
            .param("session_id", json!(session_id));
        if let Some(attachment) = attachment {
            request = request.with_attachment(attachment);
        }
        let payload = unwrap_envelope(self.backend.call(request).await?)?;
        check_status(&payload)?;
        Ok(payload)
    }

    async fn handle_reply(&self, ctx: &mut ChatContext, payload: &Map<String, Value>) {
        let usage = token_usage(payload);

        if payload.get("requires_action").and_then(Value::as_bool) == Some(true) {
            let rendered = render_result(payload, None);
            if rendered.awaits_confirmation {
                ctx.start_extraction();
                let mut turn = ChatTurn::assistant(rendered.markup).with_token_usage(usage);
                for affordance in PdfWorkflow::affordances(ctx.session_id()) {
                    turn = turn.with_affordance(affordance);
                }
                ctx.append_turn(turn);
                return;
            }
        }

        let text = ["response", "message"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .unwrap_or_default();

        match interpret(text, payload.get("suggested_action")) {
            Resolution::Display { text } => {
                ctx.append_turn(ChatTurn::assistant(display(&text)).with_token_usage(usage));
            }
            Resolution::Execute { text, action } => match text {
                Some(text) => {
                    ctx.append_turn(ChatTurn::assistant(display(&text)).with_token_usage(usage));
                    self.dispatcher.dispatch(ctx, &action).await;
                }
                None => {
                    tracing::debug!(
                        target: "dispatch",
                        "[ChatUseCase] Reply text suppressed for immediate {}",
                        action.kind()
                    );
                    self.dispatcher.dispatch_with_usage(ctx, &action, usage).await;
                }
            },
            Resolution::Suggest { text, action } => {
                let turn = ChatTurn::assistant(display(&text))
                    .with_token_usage(usage)
                    .with_affordance(Affordance::run(action));
                ctx.append_turn(turn);
            }
            Resolution::Rejected { text, error } => {
                if let Some(text) = text {
                    ctx.append_turn(ChatTurn::assistant(display(&text)).with_token_usage(usage));
                }
                report_error(ctx, &error);
            }
        }
    }
}

fn user_text(text: &str, attachment: Option<&Attachment>) -> String {
    match (text.is_empty(), attachment) {
        (_, None) => text.to_string(),
        (true, Some(file)) => format!("📎 {}", file.file_name),
        (false, Some(file)) => format!("{text}\n📎 {}", file.file_name),
    }
}

fn display(text: &str) -> Markup {
    let markup = markdown::render(text);
    if markup.is_empty() {
        Markup::element_text("p", EMPTY_REPLY)
    } else {
        markup
    }
}

fn token_usage(payload: &Map<String, Value>) -> Option<TokenUsage> {
    payload
        .get("token_usage")
        .filter(|value| value.is_object())
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
