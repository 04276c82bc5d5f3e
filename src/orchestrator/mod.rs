// src/orchestrator/mod.rs
//! Batch fetch orchestration: fetch only what is missing, one page at a time.
//!
//! An orchestration runs the prerequisite fetchers in order, resolves the
//! required identifiers, subtracts the ones already known, splits the rest
//! into batches no larger than the page size and requests those batches
//! one after another. The merged result is committed to the
//! [`DocumentStore`] only if every batch succeeds.
//!
//! Identifiers an earlier orchestration is already fetching are not
//! requested twice. The later orchestration waits for that fetch to settle
//! and then requests whatever is still missing before it settles itself.

pub mod plan;
pub mod sequential;

use crate::api::DocumentSource;
use crate::config::FetchConfig;
use crate::error::AppError;
use crate::prerequisites::{run_in_sequence, IdentifierSource, PrerequisiteFetcher};
use crate::store::{DocumentStore, FetchTicket};
use crate::types::{DocumentCollection, Identifier, PageSize};
use plan::{missing_identifiers, FetchPlan};
use sequential::fetch_chunks_sequentially;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Fetches the identifiers of `required` that are not in `known`.
///
/// Duplicates in `required` are requested once. Nothing is requested when
/// every identifier is known. Batches hold at most `page_size` identifiers
/// and are requested strictly one after another; the first failing batch
/// aborts the rest and its error is returned as-is.
pub async fn orchestrate<'a, I, F, Fut>(
    required: I,
    known: &HashSet<Identifier>,
    page_size: PageSize,
    fetch_batch: F,
) -> Result<DocumentCollection, AppError>
where
    I: IntoIterator<Item = &'a Identifier>,
    F: FnMut(usize, Vec<Identifier>) -> Fut,
    Fut: std::future::Future<Output = Result<DocumentCollection, AppError>>,
{
    let missing = missing_identifiers(required, known);
    if missing.is_empty() {
        return Ok(DocumentCollection::new());
    }
    let plan = FetchPlan::new(missing, page_size);
    fetch_chunks_sequentially(&plan, fetch_batch).await
}

/// Drives the full document fetch flow against a shared store.
pub struct BatchFetchOrchestrator {
    source: Arc<dyn DocumentSource>,
    store: Arc<DocumentStore>,
    identifiers: Arc<dyn IdentifierSource>,
    prerequisites: Vec<Arc<dyn PrerequisiteFetcher>>,
    backend_url: Option<Url>,
    page_size: PageSize,
}

impl BatchFetchOrchestrator {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<DocumentStore>,
        identifiers: Arc<dyn IdentifierSource>,
        config: &FetchConfig,
    ) -> Self {
        Self {
            source,
            store,
            identifiers,
            prerequisites: Vec::new(),
            backend_url: config.backend_url.clone(),
            page_size: config.page_size,
        }
    }

    /// Appends a prerequisite; prerequisites run in the order they were added.
    pub fn with_prerequisite(mut self, prerequisite: Arc<dyn PrerequisiteFetcher>) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn backend_url(&self) -> Option<&Url> {
        self.backend_url.as_ref()
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Runs one orchestration and settles the store with its outcome.
    ///
    /// On success the newly fetched documents are merged into the store and
    /// returned. On failure the store keeps its documents, records the
    /// failure, and the error is returned unchanged.
    pub async fn fetch_documents(&self) -> Result<DocumentCollection, AppError> {
        let mut guard = TicketGuard {
            store: &self.store,
            ticket: self.store.begin_fetch(),
        };

        run_in_sequence(&self.prerequisites).await;

        match self.fetch_missing(&mut guard.ticket).await {
            Ok(fetched) => {
                self.store.complete_fetch(guard.ticket.take(), fetched.clone());
                Ok(fetched)
            }
            Err(e) => {
                self.store.fail_fetch(guard.ticket.take(), e.failure());
                Err(e)
            }
        }
    }

    async fn fetch_missing(
        &self,
        ticket: &mut FetchTicket,
    ) -> Result<DocumentCollection, AppError> {
        let Some(base_url) = self.backend_url.as_ref() else {
            log::info!("No backend configured; skipping document fetch");
            return Ok(DocumentCollection::new());
        };

        let mut pending = self.identifiers.required_identifiers();
        let mut fetched = DocumentCollection::new();
        loop {
            let claimed = self.store.claim_missing(ticket, &pending);
            if claimed.is_empty() {
                log::debug!(
                    "All {} required document(s) already known or in flight",
                    pending.len()
                );
            } else {
                fetched.merge(self.fetch_claimed(base_url, claimed).await?);
            }

            // Documents an earlier request is still fetching: wait for it,
            // then fetch whatever it did not deliver.
            let held = self.store.held_by_older(ticket, &pending);
            if held.is_empty() {
                break;
            }
            log::info!(
                "Waiting for {} document(s) requested by an earlier fetch",
                held.len()
            );
            self.store.wait_for_older(ticket, &held).await;
            pending = held;
        }

        Ok(fetched)
    }

    async fn fetch_claimed(
        &self,
        base_url: &Url,
        claimed: Vec<Identifier>,
    ) -> Result<DocumentCollection, AppError> {
        let plan = FetchPlan::new(claimed, self.page_size);
        log::info!(
            "Fetching {} document(s) from {} in {} request(s) of up to {}",
            plan.identifier_count(),
            base_url,
            plan.chunk_count(),
            self.page_size
        );

        let source = Arc::clone(&self.source);
        let fetched = fetch_chunks_sequentially(&plan, |_, chunk| {
            let source = Arc::clone(&source);
            let base_url = base_url.clone();
            async move { source.fetch_batch(&base_url, &chunk).await }
        })
        .await?;

        log::info!("Fetched {} document(s)", fetched.len());
        Ok(fetched)
    }
}

/// Releases the ticket's claims if the orchestration is dropped before it
/// settles.
struct TicketGuard<'a> {
    store: &'a DocumentStore,
    ticket: FetchTicket,
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.store.abandon_fetch(self.ticket.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, RemoteFetchError};
    use crate::prerequisites::StaticIdentifiers;
    use crate::store::FetchStatus;
    use crate::types::Document;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn ids(values: &[&str]) -> Vec<Identifier> {
        values.iter().map(|v| Identifier::new(*v).unwrap()).collect()
    }

    fn echo(chunk: &[Identifier]) -> DocumentCollection {
        chunk
            .iter()
            .map(|id| (id.clone(), Document::new(serde_json::json!({ "id": id.as_str() }))))
            .collect()
    }

    /// Records every batch it receives; fails the batch at `fail_at`, if set.
    #[derive(Default)]
    struct ScriptedSource {
        calls: Mutex<Vec<Vec<Identifier>>>,
        fail_at: Option<usize>,
    }

    #[async_trait::async_trait]
    impl DocumentSource for ScriptedSource {
        async fn fetch_batch(
            &self,
            _base_url: &Url,
            identifiers: &[Identifier],
        ) -> Result<DocumentCollection, AppError> {
            let index = {
                let mut calls = self.calls.lock();
                calls.push(identifiers.to_vec());
                calls.len() - 1
            };
            if self.fail_at == Some(index) {
                return Err(RemoteFetchError::new(
                    Some("ServerError".to_string()),
                    Some(format!("batch {} rejected", index)),
                )
                .into());
            }
            Ok(echo(identifiers))
        }
    }

    fn config(page_size: usize) -> FetchConfig {
        FetchConfig {
            backend_url: Some(Url::parse("http://backend.test").unwrap()),
            page_size: PageSize::new(page_size).unwrap(),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn orchestrate_requests_nothing_when_all_known() {
        let required = ids(&["x"]);
        let known: HashSet<Identifier> = ids(&["x"]).into_iter().collect();
        let mut calls = 0;
        let result = orchestrate(&required, &known, PageSize::new(5).unwrap(), |_, chunk| {
            calls += 1;
            async move { Ok::<_, AppError>(echo(&chunk)) }
        })
        .await
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn orchestrate_requests_missing_in_pages() {
        let required = ids(&["a", "b", "c", "d", "e"]);
        let known: HashSet<Identifier> = ids(&["a"]).into_iter().collect();
        let mut batches = Vec::new();
        let result = orchestrate(&required, &known, PageSize::new(2).unwrap(), |_, chunk| {
            batches.push(chunk.clone());
            async move { Ok::<_, AppError>(echo(&chunk)) }
        })
        .await
        .unwrap();

        assert_eq!(batches, vec![ids(&["b", "c"]), ids(&["d", "e"])]);
        let keys: Vec<Identifier> = result.identifiers().cloned().collect();
        assert_eq!(keys, ids(&["b", "c", "d", "e"]));
    }

    #[tokio::test]
    async fn fetch_documents_commits_on_success() {
        let source = Arc::new(ScriptedSource::default());
        let store = Arc::new(DocumentStore::with_documents(echo(&ids(&["a"]))));
        let orchestrator = BatchFetchOrchestrator::new(
            source.clone(),
            Arc::clone(&store),
            Arc::new(StaticIdentifiers::new(ids(&["a", "b", "c"]))),
            &config(10),
        );

        let fetched = orchestrator.fetch_documents().await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(store.status(), FetchStatus::Succeeded);
        assert_eq!(store.len(), 3);
        assert_eq!(*source.calls.lock(), vec![ids(&["b", "c"])]);
    }

    #[tokio::test]
    async fn fetch_documents_records_failure() {
        let source = Arc::new(ScriptedSource {
            fail_at: Some(0),
            ..ScriptedSource::default()
        });
        let store = Arc::new(DocumentStore::with_documents(echo(&ids(&["a"]))));
        let orchestrator = BatchFetchOrchestrator::new(
            source,
            Arc::clone(&store),
            Arc::new(StaticIdentifiers::new(ids(&["a", "b"]))),
            &config(10),
        );

        let err = orchestrator.fetch_documents().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteFetch);
        assert_eq!(store.status(), FetchStatus::Failed);
        assert_eq!(store.len(), 1);
        let failure = store.error().unwrap();
        assert_eq!(failure.name.as_deref(), Some("ServerError"));
        assert!(store.in_flight().is_empty());
    }

    #[tokio::test]
    async fn missing_backend_url_skips_network() {
        let source = Arc::new(ScriptedSource::default());
        let store = Arc::new(DocumentStore::new());
        let orchestrator = BatchFetchOrchestrator::new(
            source.clone(),
            Arc::clone(&store),
            Arc::new(StaticIdentifiers::new(ids(&["a"]))),
            &FetchConfig::default(),
        );

        let fetched = orchestrator.fetch_documents().await.unwrap();

        assert!(fetched.is_empty());
        assert!(source.calls.lock().is_empty());
        assert_eq!(store.status(), FetchStatus::Succeeded);
    }
}
