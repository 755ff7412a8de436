//! Decides what to do with an assistant reply.

use serde_json::Value;

use super::descriptor::ActionDescriptor;
use super::extract::extract_embedded;
use crate::error::ErpaError;
use crate::sanitizer::{is_residue, sanitize, strip_directives};

/// Phrases that mean the assistant's prose contradicts an immediate action.
const SUPPRESS_PHRASES: &[&str] = &[
    "i cannot",
    "i need",
    "please provide",
    "could you",
    "if you give me",
    "however if you",
];

/// Outcome of interpreting one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Plain prose, nothing to run.
    Display { text: String },
    /// Run the action now. `text` is `None` when the prose was suppressed.
    Execute {
        text: Option<String>,
        action: ActionDescriptor,
    },
    /// Show the prose and offer the action behind one affordance.
    Suggest {
        text: String,
        action: ActionDescriptor,
    },
    /// The attached directive could not be used.
    Rejected {
        text: Option<String>,
        error: ErpaError,
    },
}

/// Interprets reply text together with its optional attached directive.
///
/// When no directive is attached one embedded in the text is used instead.
pub fn interpret(raw_text: &str, attached: Option<&Value>) -> Resolution {
    let directive = attached
        .filter(|value| !value.is_null())
        .cloned()
        .or_else(|| extract_embedded(raw_text));

    let Some(directive) = directive else {
        return Resolution::Display {
            text: sanitize(raw_text, None),
        };
    };

    match ActionDescriptor::from_value(&directive) {
        Ok(action) => {
            let cleaned = sanitize(raw_text, Some(&action));
            decide(action, cleaned)
        }
        Err(error) => {
            let cleaned = strip_directives(&sanitize(raw_text, None));
            Resolution::Rejected {
                text: (!is_residue(&cleaned)).then_some(cleaned),
                error,
            }
        }
    }
}

/// Applies the immediate-versus-confirmed rule to a parsed descriptor.
pub fn decide(action: ActionDescriptor, cleaned: String) -> Resolution {
    if action.execute_immediately {
        let text = (!should_suppress(&cleaned)).then_some(cleaned);
        Resolution::Execute { text, action }
    } else {
        Resolution::Suggest {
            text: cleaned,
            action,
        }
    }
}

fn should_suppress(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.is_empty() || SUPPRESS_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
