//! Core of the ERPA client: reply interpretation, rendering and session
//! state. Nothing here performs I/O; the [`backend::Backend`] trait is the
//! seam to the network.

pub mod action;
pub mod backend;
pub mod config;
pub mod doctype;
pub mod error;
pub mod markdown;
pub mod markup;
pub mod result;
pub mod sanitizer;
pub mod session;
pub mod workflow;

// Re-export common types
pub use backend::{Attachment, Backend, BackendRequest, Endpoint};
pub use config::ClientConfig;
pub use error::{ErpaError, Result};
pub use markup::Markup;
pub use session::{ChatContext, ChatTurn};
