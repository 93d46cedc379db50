use thiserror::Error;

/// Where a failure applies. Imp scoped failures never
/// affect sibling impressions of the same request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Index of the impression within the canonical request
    Imp(usize),
    Request,
}

/// Failure produced while shaping a request or normalizing a response.
/// These are collected alongside partial results rather than aborting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Caller attributable, e.g. bad bidder params or unsupported media
    #[error("{message}")]
    BadInput {
        imp: Option<usize>,
        message: String,
    },
    /// Partner attributable, e.g. non 200 status or undecodable body
    #[error("{message}")]
    BadServerResponse {
        status: Option<u16>,
        message: String,
    },
    /// Serialization failures and broken invariants
    #[error("internal error: {message}")]
    Internal { message: String },
    /// The transport collaborator failed to complete the exchange
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl AdapterError {
    pub fn bad_imp(index: usize, message: impl AsRef<str>) -> Self {
        AdapterError::BadInput {
            imp: Some(index),
            message: format!("imp #{}: {}", index, message.as_ref()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AdapterError::BadInput {
            imp: None,
            message: message.into(),
        }
    }

    pub fn bad_response(message: impl Into<String>) -> Self {
        AdapterError::BadServerResponse {
            status: None,
            message: message.into(),
        }
    }

    pub fn bad_status(status: u16, message: impl Into<String>) -> Self {
        AdapterError::BadServerResponse {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AdapterError::Internal {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        AdapterError::Transport {
            message: message.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            AdapterError::BadInput { imp: Some(i), .. } => Scope::Imp(*i),
            _ => Scope::Request,
        }
    }

    pub fn is_bad_input(&self) -> bool {
        matches!(self, AdapterError::BadInput { .. })
    }

    pub fn is_bad_server_response(&self) -> bool {
        matches!(self, AdapterError::BadServerResponse { .. })
    }

    /// Http status carried by a server response failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::BadServerResponse { status, .. } => *status,
            _ => None,
        }
    }
}
