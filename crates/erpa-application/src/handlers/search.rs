use erpa_core::action::SearchQuery;
use erpa_core::backend::{Backend, BackendRequest, Endpoint};
use erpa_core::error::Result;
use erpa_core::result::{Rendered, render_result};
use serde_json::{Value, json};

use super::{call, require};

pub(super) async fn dynamic_search(
    backend: &dyn Backend,
    query: &SearchQuery,
    default_limit: u32,
) -> Result<Rendered> {
    let doctype = require(Some(&query.doctype), "doctype")?;

    let request = BackendRequest::new(Endpoint::DynamicSearch)
        .param("doctype", json!(doctype))
        .param("filters", Value::Object(query.filters.clone()))
        .param("limit", json!(query.limit.unwrap_or(default_limit)))
        .param("order_by", query.order_by.as_deref().map(|order| json!(order)));

    let payload = call(backend, request).await?;
    Ok(render_result(&payload, Some(doctype)))
}

pub(super) async fn search_customers(
    backend: &dyn Backend,
    query: Option<&str>,
    limit: u32,
) -> Result<Rendered> {
    let query = require(query, "query")?;

    let request = BackendRequest::new(Endpoint::SearchCustomers)
        .param("query", json!(query))
        .param("limit", json!(limit));

    let payload = call(backend, request).await?;
    Ok(render_result(&payload, Some("Customer")))
}
