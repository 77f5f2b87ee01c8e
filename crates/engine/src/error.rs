//! Errors returned by step operations and the step driver.

use thiserror::Error;

use crate::document::DocumentError;
use crate::store::StoreError;

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced component, variable, or path is absent.
    NotFound,
    /// Field present with the wrong shape or type.
    TypeMismatch,
    /// Unification produced bottom.
    Conflict,
    /// Required input field absent.
    MissingField,
    /// A value needed concretely is still a constraint.
    Unresolved,
    UnknownOperation,
    Decode,
    Encode,
    Store,
}

/// Failure of a single step operation call.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{operation}: required field '{field}' is missing")]
    MissingField { operation: &'static str, field: &'static str },
    #[error("{operation}: an input document is required")]
    MissingInput { operation: &'static str },
    #[error("component '{name}' not found")]
    ComponentNotFound { name: String },
    #[error("{operation}: unsupported method '{method}', expected Get or Put")]
    UnsupportedMethod { operation: &'static str, method: String },
    #[error("unknown operation '{operation}' for provider '{provider}'")]
    UnknownOperation { provider: String, operation: String },
    #[error("'{key}' is reserved for context state")]
    ReservedKey { key: String },
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::MissingField { .. } | StepError::MissingInput { .. } => ErrorKind::MissingField,
            StepError::ComponentNotFound { .. } => ErrorKind::NotFound,
            StepError::UnsupportedMethod { .. } => ErrorKind::TypeMismatch,
            StepError::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            StepError::ReservedKey { .. } => ErrorKind::Conflict,
            StepError::Decode { .. } => ErrorKind::Decode,
            StepError::Encode { .. } => ErrorKind::Encode,
            StepError::Store(_) => ErrorKind::Store,
            StepError::Document(error) => match error {
                DocumentError::NotFound { .. } => ErrorKind::NotFound,
                DocumentError::TypeMismatch { .. } | DocumentError::InvalidPath { .. } => ErrorKind::TypeMismatch,
                DocumentError::Conflict { .. } => ErrorKind::Conflict,
                DocumentError::Unresolved { .. } => ErrorKind::Unresolved,
            },
        }
    }

    pub(crate) fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        StepError::Decode {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn encode(what: impl Into<String>, source: serde_json::Error) -> Self {
        StepError::Encode {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T, E = StepError> = std::result::Result<T, E>;
