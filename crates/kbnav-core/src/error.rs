//! Unified application error types for kbnav.
//!
//! Gateway failures are mapped into [`AppError`] at the gateway boundary,
//! then re-classified by the tree core into the taxonomy callers act on:
//! [`ErrorKind::FetchFailure`], [`ErrorKind::DepthLimitExceeded`],
//! [`ErrorKind::MutationRejected`] and [`ErrorKind::StaleKeyReference`].

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Loading or probing a subtree failed.
    FetchFailure,
    /// Creating a folder would exceed the maximum nesting depth.
    DepthLimitExceeded,
    /// The server refused a create, rename, or delete.
    MutationRejected,
    /// A key no longer exists in the materialized forest.
    StaleKeyReference,
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// The request never produced a usable HTTP response.
    Transport,
    /// The server answered with an error envelope.
    ExternalService,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailure => write!(f, "FETCH_FAILURE"),
            Self::DepthLimitExceeded => write!(f, "DEPTH_LIMIT_EXCEEDED"),
            Self::MutationRejected => write!(f, "MUTATION_REJECTED"),
            Self::StaleKeyReference => write!(f, "STALE_KEY_REFERENCE"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout kbnav.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message. For server-side failures this is
    /// the envelope's `msg` verbatim.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a fetch-failure error.
    pub fn fetch_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FetchFailure, message)
    }

    /// Create a depth-limit error.
    pub fn depth_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DepthLimitExceeded, message)
    }

    /// Create a mutation-rejected error.
    pub fn mutation_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MutationRejected, message)
    }

    /// Create a stale-key error.
    pub fn stale_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StaleKeyReference, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Re-tag this error with another kind, keeping the message verbatim.
    pub fn reclassify(self, kind: ErrorKind) -> Self {
        Self { kind, ..self }
    }

    /// Whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
