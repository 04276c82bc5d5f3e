// src/error.rs
//! Application error types with structured error handling.
//!
//! Remote failures arrive with whatever the backend chose to tell us: a
//! name, a message, both or neither. Those optional fields are kept as-is
//! and carried next to a mandatory [`ErrorKind`], so the reporting boundary
//! never has to guess at the shape of a failure.

use crate::constants::NETWORK_ERROR_NAME;
use crate::types::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which part of the fetch flow a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A batch request to the document service failed.
    RemoteFetch,
    /// A prerequisite collaborator failed and reported it itself.
    Prerequisite,
    /// The fetch could not be configured (bad URL, bad page size).
    Configuration,
    /// Anything else: IO, bugs, broken invariants.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteFetch => write!(f, "remote_fetch"),
            Self::Prerequisite => write!(f, "prerequisite"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// A batch request failed at the transport or the service.
///
/// Both fields are optional because the service does not always supply
/// them; a missing field is `None`, never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFetchError {
    pub name: Option<String>,
    pub message: Option<String>,
    /// HTTP status when the service answered at all.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
}

impl RemoteFetchError {
    pub fn new(name: Option<String>, message: Option<String>) -> Self {
        Self {
            name,
            message,
            status: None,
        }
    }

    /// A failure that never reached the service.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(Some(NETWORK_ERROR_NAME.to_string()), Some(message.into()))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the service reported a server-side problem.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }
}

impl fmt::Display for RemoteFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.message) {
            (Some(name), Some(message)) => write!(f, "{}: {}", name, message)?,
            (Some(name), None) => write!(f, "{}", name)?,
            (None, Some(message)) => write!(f, "{}", message)?,
            (None, None) => write!(f, "unknown remote error")?,
        }
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteFetchError {}

impl From<reqwest::Error> for RemoteFetchError {
    fn from(err: reqwest::Error) -> Self {
        let error = Self::network(err.to_string());
        match err.status() {
            Some(status) => error.with_status(status.as_u16()),
            None => error,
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(#[from] RemoteFetchError),

    #[error("Prerequisite '{source_tag}' failed: {cause}")]
    PrerequisiteFetch {
        source_tag: String,
        cause: RemoteFetchError,
    },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] ValidationError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteFetch(_) => ErrorKind::RemoteFetch,
            Self::PrerequisiteFetch { .. } => ErrorKind::Prerequisite,
            Self::ValidationError(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Attributes this failure to the prerequisite step `source_tag`.
    ///
    /// Remote causes are kept as they are; local failures are carried as a
    /// cause named after their variant.
    pub fn in_prerequisite(self, source_tag: impl Into<String>) -> Self {
        let cause = match self {
            Self::RemoteFetch(cause) | Self::PrerequisiteFetch { cause, .. } => cause,
            other => {
                let failure = other.failure();
                RemoteFetchError::new(failure.name, failure.message)
            }
        };
        Self::PrerequisiteFetch {
            source_tag: source_tag.into(),
            cause,
        }
    }

    /// Extracts the `(name, message)` record that is stored and published.
    ///
    /// Remote failures pass their fields through untouched, so a field the
    /// service left out stays `None`. Local failures are named after their
    /// variant and carry their display text.
    pub fn failure(&self) -> FetchFailure {
        let kind = self.kind();
        match self {
            Self::RemoteFetch(cause) | Self::PrerequisiteFetch { cause, .. } => FetchFailure {
                kind,
                name: cause.name.clone(),
                message: cause.message.clone(),
            },
            other => FetchFailure {
                kind,
                name: Some(other.variant_name().to_string()),
                message: Some(other.to_string()),
            },
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::RemoteFetch(_) => "RemoteFetchError",
            Self::PrerequisiteFetch { .. } => "PrerequisiteFetchError",
            Self::Io(_) => "IoError",
            Self::InternalError { .. } => "InternalError",
            Self::ValidationError(_) => "ValidationError",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteFetch(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError {
            message: format!("JSON encoding failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// Structured failure record kept by the store while its status is `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub name: Option<String>,
    pub message: Option<String>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind,
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.message.as_deref().unwrap_or("<no message>")
        )
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
