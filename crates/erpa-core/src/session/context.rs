//! What the last list, search or count put on screen.

use serde::{Deserialize, Serialize};

/// The most recent list/search/count result.
///
/// Overwritten by every successful list, search or count and cleared by a
/// new chat. Follow-up questions ("show me its details") resolve against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub doctype: String,
    pub count: u64,
    pub names: Vec<String>,
}

impl QueryContext {
    pub fn new(doctype: impl Into<String>, count: u64, names: Vec<String>) -> Self {
        Self {
            doctype: doctype.into(),
            count,
            names,
        }
    }

    /// The document name when the context holds exactly one document of
    /// `doctype`.
    pub fn single_document(&self, doctype: &str) -> Option<&str> {
        if !self.doctype.eq_ignore_ascii_case(doctype.trim()) {
            return None;
        }
        match self.names.as_slice() {
            [only] if self.count <= 1 => Some(only.as_str()),
            _ => None,
        }
    }
}
