// src/prerequisites.rs
//! Collaborators that run before the document fetch.
//!
//! Two kinds of collaborator feed the orchestrator: prerequisite fetchers,
//! which must finish before the required identifiers are known, and an
//! identifier source, which says which identifiers are required.
//!
//! Prerequisites are best-effort. Each one reports its own failure and then
//! resolves, so the orchestrator awaits them and never inspects an outcome.

use crate::error::AppError;
use crate::reporting::{report_failure, ErrorSink};
use crate::types::Identifier;
use futures::future::BoxFuture;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// A step that must complete before the required identifiers are resolved.
#[async_trait::async_trait]
pub trait PrerequisiteFetcher: Send + Sync {
    /// Tag under which this fetcher reports its failures.
    fn source_tag(&self) -> &str;

    /// Runs the step. Failures are reported internally, never returned.
    async fn run(&self);
}

/// Runs `fetchers` strictly in order: each is awaited before the next starts.
pub async fn run_in_sequence(fetchers: &[Arc<dyn PrerequisiteFetcher>]) {
    for fetcher in fetchers {
        log::debug!("Running prerequisite '{}'", fetcher.source_tag());
        fetcher.run().await;
    }
}

type FallibleStep = dyn Fn() -> BoxFuture<'static, Result<(), AppError>> + Send + Sync;

/// Adapts a fallible async step into a [`PrerequisiteFetcher`] that reports
/// its failure to an [`ErrorSink`] and then resolves.
pub struct ReportingPrerequisite {
    source_tag: String,
    step: Box<FallibleStep>,
    sink: Arc<dyn ErrorSink>,
}

impl ReportingPrerequisite {
    pub fn new<F>(source_tag: impl Into<String>, sink: Arc<dyn ErrorSink>, step: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<(), AppError>> + Send + Sync + 'static,
    {
        Self {
            source_tag: source_tag.into(),
            step: Box::new(step),
            sink,
        }
    }
}

#[async_trait::async_trait]
impl PrerequisiteFetcher for ReportingPrerequisite {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    async fn run(&self) {
        if let Err(e) = (self.step)().await {
            let e = e.in_prerequisite(self.source_tag.as_str());
            log::warn!("{}", e);
            report_failure(self.sink.as_ref(), &self.source_tag, &e);
        }
    }
}

/// Derives the identifiers the application currently needs.
pub trait IdentifierSource: Send + Sync {
    fn required_identifiers(&self) -> Vec<Identifier>;
}

/// A fixed list of required identifiers.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentifiers(Vec<Identifier>);

impl StaticIdentifiers {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        Self(identifiers)
    }
}

impl IdentifierSource for StaticIdentifiers {
    fn required_identifiers(&self) -> Vec<Identifier> {
        self.0.clone()
    }
}

/// Image selection for one slot of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSelection {
    pub front: Option<Identifier>,
    pub back: Option<Identifier>,
}

/// Identifiers selected across the slots of a project plus its shared
/// cardback.
///
/// A slot without its own back falls back to the shared cardback, so the
/// cardback is required whenever it is set.
#[derive(Debug, Default)]
pub struct ProjectSelections {
    slots: RwLock<Vec<SlotSelection>>,
    cardback: RwLock<Option<Identifier>>,
}

impl ProjectSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_slot(&self, slot: SlotSelection) {
        self.slots.write().push(slot);
    }

    pub fn set_slots(&self, slots: Vec<SlotSelection>) {
        *self.slots.write() = slots;
    }

    pub fn set_cardback(&self, cardback: Option<Identifier>) {
        *self.cardback.write() = cardback;
    }
}

impl IdentifierSource for ProjectSelections {
    fn required_identifiers(&self) -> Vec<Identifier> {
        let slots = self.slots.read();
        let mut unique: IndexSet<Identifier> = IndexSet::new();
        for slot in slots.iter() {
            unique.extend(slot.front.iter().cloned());
            unique.extend(slot.back.iter().cloned());
        }
        unique.extend(self.cardback.read().iter().cloned());
        unique.into_iter().collect()
    }
}
