// src/api/mod.rs
//! Document service interaction — the ability to retrieve a batch of documents.
//!
//! I/O, response parsing and orchestration are kept apart: the orchestrator
//! depends only on [`DocumentSource`], never on HTTP details.

pub mod client;
pub mod parser;

use crate::error::AppError;
use crate::types::{DocumentCollection, Identifier};
use std::sync::Arc;
use url::Url;

/// The ability to retrieve documents from the remote service by identifier.
///
/// Implementations must not be handed more identifiers than the configured
/// page size; the orchestrator guarantees this. A failed batch is reported
/// as [`AppError::RemoteFetch`].
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_batch(
        &self,
        base_url: &Url,
        identifiers: &[Identifier],
    ) -> Result<DocumentCollection, AppError>;
}

#[async_trait::async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    async fn fetch_batch(
        &self,
        base_url: &Url,
        identifiers: &[Identifier],
    ) -> Result<DocumentCollection, AppError> {
        (**self).fetch_batch(base_url, identifiers).await
    }
}

pub use client::DocumentHttpClient;
