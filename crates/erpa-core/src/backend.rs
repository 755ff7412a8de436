//! Backend trait and request/response envelope handling.
//!
//! Defines the interface to the remote assistant and ERP service, decoupling
//! the use cases from the HTTP transport.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::action::AggregateKind;
use crate::error::{ErpaError, Result};

/// Named remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SendMessage,
    ClearHistory,
    CreateDocument,
    FindDuplicates,
    CountDocuments,
    DynamicSearch,
    GetDocumentDetails,
    SearchCustomers,
    Aggregate(AggregateKind),
    PdfWorkflowRespond,
    CheckPdfContext,
}

impl Endpoint {
    /// Method path below the configured prefix, e.g. `ai_chat.count_documents`.
    pub fn method_name(&self) -> String {
        let name = match self {
            Self::SendMessage => "ai_chat.process_chat",
            Self::ClearHistory => "ai_chat.clear_history",
            Self::CreateDocument => "ai_chat.create_document",
            Self::FindDuplicates => "ai_chat.find_duplicates",
            Self::CountDocuments => "ai_chat.count_documents",
            Self::DynamicSearch => "ai_chat.dynamic_search",
            Self::GetDocumentDetails => "ai_chat.get_document_details",
            Self::SearchCustomers => "ai_chat.search_customers",
            Self::Aggregate(kind) => return format!("ai_chat.{}", kind.action_kind()),
            Self::PdfWorkflowRespond => "pdf_chat_integration.handle_pdf_response",
            Self::CheckPdfContext => "pdf_chat_integration.check_pdf_context",
        };
        name.to_string()
    }
}

/// Which form field an attachment is sent under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
}

impl AttachmentKind {
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Guesses the kind from a file name; anything that is not a PDF is
    /// treated as an image.
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_lowercase().ends_with(".pdf") {
            Self::Pdf
        } else {
            Self::Image
        }
    }
}

/// A file sent along with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            kind: AttachmentKind::from_file_name(&file_name),
            file_name,
            bytes,
        }
    }
}

/// One call to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub endpoint: Endpoint,
    pub params: Map<String, Value>,
    pub attachment: Option<Attachment>,
}

impl BackendRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: Map::new(),
            attachment: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    /// Adds one parameter; `None` values are left out.
    pub fn param(mut self, key: &str, value: impl Into<Option<Value>>) -> Self {
        if let Some(value) = value.into() {
            self.params.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// The remote service.
///
/// Implementations return the raw response body. Callers unwrap the
/// envelope with [`unwrap_envelope`] and check [`check_status`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Performs one round trip.
    ///
    /// # Errors
    ///
    /// - `Connectivity`: the server could not be reached
    /// - `Transport`: non-success HTTP status
    /// - `MalformedPayload`: the body is not JSON
    async fn call(&self, request: BackendRequest) -> Result<Value>;
}

/// Unwraps `{message: {...}}`. Only an object-valued `message` is an
/// envelope; a string `message` is a field of the payload itself.
pub fn unwrap_envelope(body: Value) -> Result<Map<String, Value>> {
    match body {
        Value::Object(mut object) => {
            if matches!(object.get("message"), Some(Value::Object(_))) {
                if let Some(Value::Object(inner)) = object.remove("message") {
                    return Ok(inner);
                }
            }
            Ok(object)
        }
        other => Err(ErpaError::malformed(format!(
            "Expected a JSON object from the server, got {}",
            value_kind(&other)
        ))),
    }
}

/// Fails with the backend's own message when `status` is present and not
/// `success`.
pub fn check_status(payload: &Map<String, Value>) -> Result<()> {
    match payload.get("status").and_then(Value::as_str) {
        None | Some("success") => Ok(()),
        Some(_) => {
            let message = ["message", "response", "error"]
                .iter()
                .find_map(|key| payload.get(*key).and_then(Value::as_str))
                .unwrap_or_default();
            Err(ErpaError::backend(message))
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwraps_object_message() {
        let payload = unwrap_envelope(json!({"message": {"status": "success", "total_count": 4}}))
            .unwrap();
        assert_eq!(payload["total_count"], json!(4));
    }

    #[test]
    fn test_string_message_is_not_an_envelope() {
        let payload =
            unwrap_envelope(json!({"status": "error", "message": "Not permitted"})).unwrap();
        assert_eq!(payload["message"], json!("Not permitted"));
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        let err = unwrap_envelope(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ErpaError::MalformedPayload(_)));
    }

    #[test]
    fn test_check_status() {
        let ok = json!({"status": "success"});
        assert!(check_status(ok.as_object().unwrap()).is_ok());

        let failed = json!({"status": "error", "message": "Customer not found"});
        assert_eq!(
            check_status(failed.as_object().unwrap()),
            Err(ErpaError::backend("Customer not found"))
        );

        let info = json!({"status": "info", "message": "Nothing pending"});
        assert!(check_status(info.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Endpoint::CountDocuments.method_name(), "ai_chat.count_documents");
        assert_eq!(
            Endpoint::Aggregate(AggregateKind::MostSoldItems).method_name(),
            "ai_chat.get_most_sold_items"
        );
        assert_eq!(
            Endpoint::PdfWorkflowRespond.method_name(),
            "pdf_chat_integration.handle_pdf_response"
        );
    }

    #[test]
    fn test_attachment_kind() {
        assert_eq!(Attachment::new("order.PDF", vec![]).kind, AttachmentKind::Pdf);
        assert_eq!(Attachment::new("scan.png", vec![]).kind, AttachmentKind::Image);
    }
}
