//! Action descriptors: parsing, legacy aliases and the run/confirm decision.

pub mod descriptor;
pub mod extract;
pub mod kind;
pub mod resolver;

pub use descriptor::{
    Action, ActionDescriptor, AggregateParams, DEFAULT_DOCTYPE, DetailQuery, SearchQuery,
};
pub use extract::extract_embedded;
pub use kind::{ActionKind, AggregateKind, LegacyAlias, ResolvedName};
pub use resolver::{Resolution, decide, interpret};
