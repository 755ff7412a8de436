use erpa_core::backend::{Backend, BackendRequest, Endpoint};
use erpa_core::error::Result;
use erpa_core::result::{Rendered, format};
use serde_json::{Map, Value, json};

use super::{call, require};

pub(super) async fn count_documents(
    backend: &dyn Backend,
    doctype: &str,
    filters: Option<&Map<String, Value>>,
) -> Result<Rendered> {
    let doctype = require(Some(doctype), "doctype")?;

    let request = BackendRequest::new(Endpoint::CountDocuments)
        .param("doctype", json!(doctype))
        .param("filters", filters.cloned().map(Value::Object));

    let payload = call(backend, request).await?;
    Ok(format::count_summary(doctype, &payload))
}

pub(super) async fn find_duplicates(backend: &dyn Backend, doctype: &str) -> Result<Rendered> {
    let doctype = require(Some(doctype), "doctype")?;

    let request = BackendRequest::new(Endpoint::FindDuplicates).param("doctype", json!(doctype));

    let payload = call(backend, request).await?;
    Ok(format::duplicates(doctype, &payload))
}
