//! Action handler registry.
//!
//! One handler per action kind, selected by an exhaustive match. Every
//! handler validates its parameters before touching the network, makes one
//! backend call and renders the result.

mod aggregates;
mod counts;
mod documents;
mod search;

use std::sync::Arc;

use erpa_core::action::{Action, ActionDescriptor};
use erpa_core::backend::{Backend, BackendRequest, check_status, unwrap_envelope};
use erpa_core::config::DEFAULT_LIMIT;
use erpa_core::error::{ErpaError, Result};
use erpa_core::result::Rendered;
use erpa_core::session::{ChatContext, ChatTurn, TokenUsage};
use serde_json::{Map, Value};

use crate::outcome::report_error;

/// Runs action descriptors against the backend.
#[derive(Clone)]
pub struct ActionDispatcher {
    backend: Arc<dyn Backend>,
    default_limit: u32,
}

impl ActionDispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Runs one action and appends its result (or failure) to the
    /// transcript. Each call is independent; nothing is deduplicated.
    pub async fn dispatch(&self, ctx: &mut ChatContext, descriptor: &ActionDescriptor) {
        self.dispatch_with_usage(ctx, descriptor, None).await;
    }

    /// Like [`dispatch`](Self::dispatch), but bills `usage` to the turn the
    /// action produces. Used when the reply that carried the action showed
    /// no text of its own.
    pub async fn dispatch_with_usage(
        &self,
        ctx: &mut ChatContext,
        descriptor: &ActionDescriptor,
        usage: Option<TokenUsage>,
    ) {
        tracing::info!(
            target: "dispatch",
            "[ActionDispatcher] Running {}{}",
            descriptor.kind(),
            descriptor
                .alias
                .map(|alias| format!(" (from {alias})"))
                .unwrap_or_default()
        );

        match self.run(ctx, &descriptor.action).await {
            Ok(rendered) => {
                if let Some(context) = rendered.context {
                    ctx.set_query_context(context);
                }
                ctx.append_turn(ChatTurn::assistant(rendered.markup).with_token_usage(usage));
            }
            Err(err) => {
                let before = ctx.transcript().len();
                report_error(ctx, &err);
                if ctx.transcript().len() > before {
                    if let Some(turn) = ctx.last_turn_mut() {
                        turn.token_usage = usage;
                    }
                }
            }
        }
    }

    async fn run(&self, ctx: &ChatContext, action: &Action) -> Result<Rendered> {
        let backend = self.backend.as_ref();
        match action {
            Action::DynamicSearch(query) => {
                search::dynamic_search(backend, query, self.default_limit).await
            }
            Action::SearchCustomers { query, limit } => {
                search::search_customers(
                    backend,
                    query.as_deref(),
                    limit.unwrap_or(self.default_limit),
                )
                .await
            }
            Action::GetDocumentDetails(query) => {
                documents::document_details(backend, ctx, query).await
            }
            Action::CreateDocument { doctype, fields } => {
                documents::create_document(backend, doctype.as_deref(), fields).await
            }
            Action::FindDuplicates { doctype } => counts::find_duplicates(backend, doctype).await,
            Action::CountDocuments { doctype, filters } => {
                counts::count_documents(backend, doctype, filters.as_ref()).await
            }
            Action::Aggregate { kind, params } => aggregates::run(backend, *kind, params).await,
        }
    }
}

/// One round trip: call, unwrap the envelope, check the status.
pub(crate) async fn call(backend: &dyn Backend, request: BackendRequest) -> Result<Map<String, Value>> {
    let endpoint = request.endpoint;
    let body = backend.call(request).await?;
    let payload = unwrap_envelope(body)?;
    check_status(&payload)?;
    tracing::debug!(
        target: "dispatch",
        "[ActionDispatcher] {} returned {} field(s)",
        endpoint.method_name(),
        payload.len()
    );
    Ok(payload)
}

/// A required, non-blank string parameter.
pub(crate) fn require<'a>(value: Option<&'a str>, param: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ErpaError::missing_param(param))
}
