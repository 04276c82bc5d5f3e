//! Shared test doubles for the integration suites.
#![allow(dead_code)]

use docbatch::{
    AppError, Document, DocumentCollection, DocumentSource, Identifier, PrerequisiteFetcher,
    RemoteFetchError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use url::Url;

pub fn id(value: &str) -> Identifier {
    Identifier::new(value).expect("test identifier should be valid")
}

pub fn ids(values: &[&str]) -> Vec<Identifier> {
    values.iter().map(|v| id(v)).collect()
}

pub fn documents(values: &[&str]) -> DocumentCollection {
    values
        .iter()
        .map(|v| (id(v), Document::new(serde_json::json!({ "identifier": v, "name": v }))))
        .collect()
}

pub fn backend() -> Url {
    Url::parse("http://backend.test").expect("test URL should parse")
}

/// Shared, ordered log of what the doubles did.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Answers every batch with one document per identifier, journaling each
/// request's start and end. Fails the batch at `fail_at` (0-based).
pub struct RecordingSource {
    pub calls: Mutex<Vec<Vec<Identifier>>>,
    journal: Journal,
    fail_at: Option<usize>,
}

impl RecordingSource {
    pub fn new(journal: Journal) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            journal,
            fail_at: None,
        }
    }

    pub fn failing_at(journal: Journal, index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new(journal)
        }
    }

    pub fn calls(&self) -> Vec<Vec<Identifier>> {
        self.calls.lock().clone()
    }

    pub fn failure_for(index: usize) -> RemoteFetchError {
        RemoteFetchError::new(
            Some("ServiceError".to_string()),
            Some(format!("batch {} rejected", index)),
        )
        .with_status(500)
    }
}

#[async_trait::async_trait]
impl DocumentSource for RecordingSource {
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
        self.journal.lock().push(format!("batch {} start", index));
        tokio::task::yield_now().await;
        self.journal.lock().push(format!("batch {} end", index));

        if self.fail_at == Some(index) {
            return Err(Self::failure_for(index).into());
        }
        Ok(identifiers
            .iter()
            .map(|i| (i.clone(), Document::new(serde_json::json!({ "identifier": i }))))
            .collect())
    }
}

/// Holds its first batch in flight until the test releases it. Batches
/// whose index is in `failing` are rejected.
pub struct GatedSource {
    pub calls: Mutex<Vec<Vec<Identifier>>>,
    pub entered: Notify,
    pub release: Semaphore,
    failing: Vec<usize>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    pub fn failing(batches: &[usize]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            entered: Notify::new(),
            release: Semaphore::new(0),
            failing: batches.to_vec(),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Identifier>> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl DocumentSource for GatedSource {
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
        if index == 0 {
            self.entered.notify_one();
            let _permit = self.release.acquire().await;
        }
        if self.failing.contains(&index) {
            return Err(RecordingSource::failure_for(index).into());
        }
        Ok(identifiers
            .iter()
            .map(|i| (i.clone(), Document::new(serde_json::json!({ "identifier": i }))))
            .collect())
    }
}

/// Prerequisite that journals its start and end.
pub struct JournalingPrerequisite {
    pub tag: &'static str,
    pub journal: Journal,
}

#[async_trait::async_trait]
impl PrerequisiteFetcher for JournalingPrerequisite {
    fn source_tag(&self) -> &str {
        self.tag
    }

    async fn run(&self) {
        self.journal.lock().push(format!("{} start", self.tag));
        tokio::task::yield_now().await;
        self.journal.lock().push(format!("{} end", self.tag));
    }
}
