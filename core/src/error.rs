//! Error types for the movie collection core.
//!
//! # Design
//! Three families, matching how each one is handled:
//! - `ApiError`: the server answered, but not with what we needed. `NotFound`
//!   and `Rejected` (server-side validation) get dedicated variants so the UI
//!   can word the notice; every other non-2xx lands in `HttpError`.
//! - `TransportError` (see `http`): no response arrived.
//! - `ValidationError`: the form was refused locally before any request was
//!   built.
//!
//! `Error` wraps all of them. API and transport errors are both "operation
//! failed" to the state machines; validation never reaches the network.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `ResourceClient` parse methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404; the requested item does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server refused the payload and said why, field by field.
    #[error("rejected by server (HTTP {status}): {}", summarize(.errors))]
    Rejected {
        status: u16,
        errors: BTreeMap<String, Vec<String>>,
    },

    /// The server returned any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

fn summarize(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Rating,
}

/// Client-side form rejection. Blocks submission before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyName => Field::Name,
            ValidationError::RatingOutOfRange(_) => Field::Rating,
        }
    }
}

/// Top-level error for store and state machine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("operation failed: {0}")]
    Api(#[from] ApiError),

    #[error("operation failed: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// An operation was invoked in a state that does not accept it.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    /// The id is not in the authoritative collection.
    #[error("no item with id {0} in the collection")]
    UnknownItem(String),

    /// An editor was handed a snapshot of a different item.
    #[error("editor for item {expected} received item {actual}")]
    ItemMismatch { expected: String, actual: String },
}

impl Error {
    /// Network or HTTP failure, with no distinction between 4xx and 5xx.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Error::Api(_) | Error::Transport(_))
    }

    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Per-field messages, from either the local gate or the server.
    pub fn field_messages(&self) -> Vec<(String, String)> {
        match self {
            Error::Validation(e) => vec![(format!("{:?}", e.field()), e.to_string())],
            Error::Api(ApiError::Rejected { errors, .. }) => errors
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |m| (field.clone(), m.clone()))
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
