//! Session-scoped document store and its fetch status machine.
//!
//! The store is the only shared state in the fetch flow. It is handed to the
//! orchestrator as an `Arc<DocumentStore>` and changes only through the
//! operations below; every mutation holds the lock for the length of one
//! merge or status transition and never across an `.await`.
//!
//! # Status
//!
//! Each orchestration moves the status `idle → loading → succeeded | failed`.
//! A failure leaves previously committed documents alone.
//!
//! # Overlapping orchestrations
//!
//! Two guards keep overlapping runs from stepping on each other:
//!
//! - **Claims.** Identifiers a running orchestration is fetching are held in
//!   an in-flight map together with the claiming generation. A second
//!   orchestration does not request them again. If the holder is older, the
//!   second orchestration waits for the claim to be released and fetches
//!   whatever is still unknown itself, so it never settles `succeeded`
//!   while a required document is missing. Waits only ever point at older
//!   generations.
//! - **Generations.** Every [`DocumentStore::begin_fetch`] bumps a counter.
//!   Only the completion of the latest generation may overwrite status and
//!   error. Documents from an older successful run are still merged, since
//!   merging is monotonic.

mod events;

pub use events::StoreEvent;

use crate::constants::STORE_EVENT_CAPACITY;
use crate::error::FetchFailure;
use crate::orchestrator::plan::missing_identifiers;
use crate::types::{Document, DocumentCollection, Identifier};
use indexmap::IndexSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::{broadcast, Notify};

/// Lifecycle marker of the most recent orchestration attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Handle for one orchestration, returned by [`DocumentStore::begin_fetch`].
///
/// Must be settled exactly once with [`DocumentStore::complete_fetch`] or
/// [`DocumentStore::fail_fetch`]; settling releases its claims.
#[derive(Debug)]
#[must_use = "a fetch ticket must be settled with complete_fetch or fail_fetch"]
pub struct FetchTicket {
    generation: u64,
    claimed: Vec<Identifier>,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identifiers this orchestration holds in the in-flight set.
    pub fn claimed(&self) -> &[Identifier] {
        &self.claimed
    }

    /// Moves the claims into a new ticket, leaving this one with none.
    pub(crate) fn take(&mut self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            claimed: std::mem::take(&mut self.claimed),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    documents: DocumentCollection,
    status: FetchStatus,
    error: Option<FetchFailure>,
    generation: u64,
    in_flight: HashMap<Identifier, u64>,
}

/// Known documents plus the status and last error of the fetch flow.
pub struct DocumentStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    released: Notify,
}

impl DocumentStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(STORE_EVENT_CAPACITY);
        Self {
            state: RwLock::new(StoreState::default()),
            events,
            released: Notify::new(),
        }
    }

    /// Creates a store pre-seeded with documents obtained elsewhere.
    pub fn with_documents(documents: DocumentCollection) -> Self {
        let store = Self::new();
        store.state.write().documents = documents;
        store
    }

    /// Subscribes to status transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn status(&self) -> FetchStatus {
        self.state.read().status
    }

    /// The last failure; present only while the status is `failed`.
    pub fn error(&self) -> Option<FetchFailure> {
        self.state.read().error.clone()
    }

    pub fn documents(&self) -> DocumentCollection {
        self.state.read().documents.clone()
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.state.read().documents.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.read().documents.contains(id)
    }

    pub fn known_identifiers(&self) -> HashSet<Identifier> {
        self.state.read().documents.identifier_set()
    }

    pub fn in_flight(&self) -> HashSet<Identifier> {
        self.state.read().in_flight.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().documents.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Union-merges a batch into the known documents, independent of any fetch.
    pub fn add_documents(&self, batch: DocumentCollection) {
        if batch.is_empty() {
            return;
        }
        let mut state = self.state.write();
        state.documents.merge(batch);
    }

    /// Marks the start of an orchestration: status becomes `loading`.
    pub fn begin_fetch(&self) -> FetchTicket {
        let generation = {
            let mut state = self.state.write();
            state.generation += 1;
            state.status = FetchStatus::Loading;
            state.error = None;
            state.generation
        };
        log::debug!("Document fetch {} pending", generation);
        let _ = self.events.send(StoreEvent::Pending { generation });
        FetchTicket {
            generation,
            claimed: Vec::new(),
        }
    }

    /// Claims the identifiers of `required` that are neither known nor
    /// already being fetched by another orchestration.
    ///
    /// The returned identifiers are in first-seen order with duplicates
    /// collapsed, and are recorded on the ticket until it is settled.
    pub fn claim_missing<'a, I>(&self, ticket: &mut FetchTicket, required: I) -> Vec<Identifier>
    where
        I: IntoIterator<Item = &'a Identifier>,
    {
        let mut state = self.state.write();
        let state = &mut *state;
        let candidates = missing_identifiers(required, &state.documents.identifier_set());

        let mut claimed = Vec::with_capacity(candidates.len());
        let mut held_elsewhere = 0usize;
        for id in candidates {
            match state.in_flight.entry(id) {
                Entry::Vacant(slot) => {
                    claimed.push(slot.key().clone());
                    slot.insert(ticket.generation);
                }
                Entry::Occupied(_) => held_elsewhere += 1,
            }
        }
        if held_elsewhere > 0 {
            log::debug!(
                "{} identifier(s) already being fetched by another request",
                held_elsewhere
            );
        }

        ticket.claimed.extend(claimed.iter().cloned());
        claimed
    }

    /// Identifiers of `required` that are still unknown and held by an
    /// orchestration that started before `ticket`.
    pub fn held_by_older<'a, I>(&self, ticket: &FetchTicket, required: I) -> Vec<Identifier>
    where
        I: IntoIterator<Item = &'a Identifier>,
    {
        let state = self.state.read();
        let held: IndexSet<&Identifier> = required
            .into_iter()
            .filter(|id| matches!(state.in_flight.get(*id), Some(&g) if g < ticket.generation))
            .filter(|id| !state.documents.contains(id.as_str()))
            .collect();
        held.into_iter().cloned().collect()
    }

    /// Waits until none of `identifiers` is held by an orchestration older
    /// than `ticket`.
    pub async fn wait_for_older(&self, ticket: &FetchTicket, identifiers: &[Identifier]) {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed.
            notified.as_mut().enable();
            if self.held_by_older(ticket, identifiers).is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Commits a successful orchestration: merges `fetched` and, if this is
    /// the latest orchestration, sets the status to `succeeded`.
    pub fn complete_fetch(&self, ticket: FetchTicket, fetched: DocumentCollection) {
        let fetched_count = fetched.len();
        let current = {
            let mut state = self.state.write();
            release(&mut state.in_flight, &ticket);
            state.documents.merge(fetched);
            let current = state.generation == ticket.generation;
            if current {
                state.status = FetchStatus::Succeeded;
                state.error = None;
            }
            current
        };
        self.released.notify_waiters();
        if !current {
            log::debug!(
                "Document fetch {} finished after a newer fetch started; status left unchanged",
                ticket.generation
            );
        }
        let _ = self.events.send(StoreEvent::Fulfilled {
            generation: ticket.generation,
            fetched: fetched_count,
        });
    }

    /// Records a failed orchestration. Known documents are left untouched.
    pub fn fail_fetch(&self, ticket: FetchTicket, failure: FetchFailure) {
        let current = {
            let mut state = self.state.write();
            release(&mut state.in_flight, &ticket);
            let current = state.generation == ticket.generation;
            if current {
                state.status = FetchStatus::Failed;
                state.error = Some(failure.clone());
            }
            current
        };
        self.released.notify_waiters();
        if !current {
            log::debug!(
                "Document fetch {} failed after a newer fetch started; status left unchanged",
                ticket.generation
            );
        }
        let _ = self.events.send(StoreEvent::Rejected {
            generation: ticket.generation,
            failure,
        });
    }

    /// Releases the claims of an orchestration that will never settle.
    /// Status and error are left as they are.
    pub fn abandon_fetch(&self, ticket: FetchTicket) {
        if ticket.claimed.is_empty() {
            return;
        }
        release(&mut self.state.write().in_flight, &ticket);
        self.released.notify_waiters();
        log::debug!(
            "Document fetch {} abandoned; released {} claim(s)",
            ticket.generation,
            ticket.claimed.len()
        );
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("DocumentStore")
            .field("documents", &state.documents.len())
            .field("status", &state.status)
            .field("error", &state.error)
            .field("generation", &state.generation)
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

/// Drops the ticket's claims, leaving any claim re-taken by another
/// generation in place.
fn release(in_flight: &mut HashMap<Identifier, u64>, ticket: &FetchTicket) {
    for id in &ticket.claimed {
        if in_flight.get(id) == Some(&ticket.generation) {
            in_flight.remove(id);
        }
    }
}
