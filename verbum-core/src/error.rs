use thiserror::Error;

use crate::model::{AnnotationId, BookId};

/// Failure taxonomy shared by the session and every content client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    /// Transport failure: connection refused, timeout, TLS
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered `success: false`
    #[error("{0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid annotation: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(NotFoundTarget),

    /// Chapter stepping past the first or last chapter. Never shown to the user.
    #[error("chapter {requested} is outside 1..={last}")]
    Boundary { requested: i64, last: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundTarget {
    Annotation(AnnotationId),
    Book(BookId),
}

impl std::fmt::Display for NotFoundTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundTarget::Annotation(id) => write!(f, "annotation {id}"),
            NotFoundTarget::Book(id) => write!(f, "book {id}"),
        }
    }
}

impl ReaderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ReaderError::Validation(msg.into())
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ReaderError::Network(_))
    }
}

pub type Result<T, E = ReaderError> = std::result::Result<T, E>;
