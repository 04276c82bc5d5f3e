// src/reporting.rs
//! The error-reporting boundary of the fetch flow.
//!
//! Internal layers propagate failures unchanged. This is the one place that
//! catches them: it turns the failure into an [`ErrorEvent`], publishes it
//! to an [`ErrorSink`], and hands the caller `None` instead of an error.
//!
//! A `None` from [`fetch_documents_and_report_error`] therefore means
//! "failed and already reported". Callers that need the reason should read
//! the store's status and error rather than expect one here.

use crate::constants::DOCUMENT_FETCH_SOURCE_TAG;
use crate::error::{AppError, ErrorKind};
use crate::orchestrator::BatchFetchOrchestrator;
use crate::types::DocumentCollection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Tagged failure notification for observers (toasts, logs, tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub source_tag: String,
    pub kind: ErrorKind,
    pub name: Option<String>,
    pub message: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl ErrorEvent {
    pub fn from_error(source_tag: impl Into<String>, error: &AppError) -> Self {
        let failure = error.failure();
        Self {
            source_tag: source_tag.into(),
            kind: failure.kind,
            name: failure.name,
            message: failure.message,
            reported_at: Utc::now(),
        }
    }
}

/// Where error events are published.
pub trait ErrorSink: Send + Sync {
    fn publish(&self, event: ErrorEvent);
}

impl<T: ErrorSink + ?Sized> ErrorSink for Arc<T> {
    fn publish(&self, event: ErrorEvent) {
        (**self).publish(event)
    }
}

/// Publishes error events to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn publish(&self, event: ErrorEvent) {
        log::error!(
            "[{}] {}: {}",
            event.source_tag,
            event.name.as_deref().unwrap_or("Error"),
            event.message.as_deref().unwrap_or("no details provided")
        );
    }
}

/// Forwards error events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelErrorSink {
    tx: mpsc::UnboundedSender<ErrorEvent>,
}

impl ChannelErrorSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ErrorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ErrorSink for ChannelErrorSink {
    fn publish(&self, event: ErrorEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Error event dropped: receiver closed");
        }
    }
}

/// Publishes `error` under `source_tag`.
pub fn report_failure(sink: &dyn ErrorSink, source_tag: &str, error: &AppError) {
    sink.publish(ErrorEvent::from_error(source_tag, error));
}

/// Runs one document orchestration and reports its failure, if any.
///
/// Returns the fetched collection on success. On failure the error is
/// published under [`DOCUMENT_FETCH_SOURCE_TAG`] and `None` is returned;
/// the error is not re-raised.
pub async fn fetch_documents_and_report_error(
    orchestrator: &BatchFetchOrchestrator,
    sink: &dyn ErrorSink,
) -> Option<DocumentCollection> {
    match orchestrator.fetch_documents().await {
        Ok(documents) => Some(documents),
        Err(e) => {
            report_failure(sink, DOCUMENT_FETCH_SOURCE_TAG, &e);
            None
        }
    }
}
