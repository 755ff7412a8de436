use erpa_core::action::{DetailQuery, Resolution, interpret};
use erpa_core::backend::{Backend, BackendRequest, Endpoint};
use erpa_core::error::{ErpaError, Result};
use erpa_core::markdown;
use erpa_core::result::detail::{DocumentSource, detail_view, locate_document, wants_full_details};
use erpa_core::result::{Rendered, format};
use erpa_core::sanitizer::{is_residue, sanitize, strip_directives};
use erpa_core::session::ChatContext;
use serde_json::{Map, Value, json};

use super::{call, require};

pub(super) async fn document_details(
    backend: &dyn Backend,
    ctx: &ChatContext,
    query: &DetailQuery,
) -> Result<Rendered> {
    let doctype = require(Some(&query.doctype), "doctype")?;
    let name = match require(query.name.as_deref(), "name") {
        Ok(name) => name,
        Err(err) => ctx
            .query_context()
            .and_then(|context| context.single_document(doctype))
            .ok_or(err)?,
    };

    let request = BackendRequest::new(Endpoint::GetDocumentDetails)
        .param("doctype", json!(doctype))
        .param("name", json!(name));
    let payload = call(backend, request).await?;

    let (document, source) = locate_document(&payload, doctype).ok_or_else(|| {
        ErpaError::malformed(format!(
            "The server did not return the details of {doctype} {name}."
        ))
    })?;
    if let DocumentSource::CompatibilityScan(key) = &source {
        tracing::warn!(
            target: "dispatch",
            "[ActionDispatcher] {doctype} {name} found under legacy key '{key}'"
        );
    }

    match query.question.as_deref().map(str::trim) {
        Some(question) if !question.is_empty() && !wants_full_details(question) => {
            answer_question(backend, ctx.session_id(), doctype, document, question).await
        }
        _ => Ok(Rendered::new(detail_view(doctype, document))),
    }
}

/// Forwards a specific question together with the document to the
/// assistant and renders its answer.
async fn answer_question(
    backend: &dyn Backend,
    session_id: &str,
    doctype: &str,
    document: &Map<String, Value>,
    question: &str,
) -> Result<Rendered> {
    let document_json = serde_json::to_string_pretty(document)?;
    let message = format!(
        "Answer the question using only this {doctype} record.\n\nQuestion: {question}\n\nRecord:\n{document_json}"
    );

    let request = BackendRequest::new(Endpoint::SendMessage)
        .param("message", json!(message))
        .param("session_id", json!(session_id));
    let payload = call(backend, request).await?;

    let answer = ["response", "message"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ErpaError::malformed("The assistant returned an empty answer."))?;

    // Directives riding on an answer are cleaned out but never run from here.
    let text = match interpret(answer, payload.get("suggested_action")) {
        Resolution::Display { text } => Some(text),
        Resolution::Suggest { text, action } | Resolution::Execute { text: Some(text), action } => {
            tracing::debug!(target: "dispatch", "[Details] Ignoring {} attached to answer", action.kind());
            Some(text)
        }
        Resolution::Execute { text: None, .. } | Resolution::Rejected { text: None, .. } => None,
        Resolution::Rejected { text: Some(text), .. } => Some(text),
    };
    let text = text
        .or_else(|| {
            let cleaned = strip_directives(&sanitize(answer, None));
            (!is_residue(&cleaned)).then_some(cleaned)
        })
        .ok_or_else(|| ErpaError::malformed("The assistant returned an empty answer."))?;

    Ok(Rendered::new(markdown::render(&text)))
}

pub(super) async fn create_document(
    backend: &dyn Backend,
    doctype: Option<&str>,
    fields: &Map<String, Value>,
) -> Result<Rendered> {
    let doctype = require(doctype, "doctype")?;
    if fields.is_empty() {
        return Err(ErpaError::validation(format!(
            "No fields were provided for the new {doctype}."
        )));
    }

    let request = BackendRequest::new(Endpoint::CreateDocument)
        .param("doctype", json!(doctype))
        .param("fields", Value::Object(fields.clone()));

    let payload = call(backend, request).await?;
    Ok(format::created(Some(doctype), &payload))
}
