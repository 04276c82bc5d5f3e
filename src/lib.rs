// src/lib.rs
//! docbatch library — fetches keyed documents in bounded, sequential batches.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `RemoteFetchError`, `FetchFailure`, `ValidationError`
//! - **Configuration** — `FetchConfig`
//! - **Domain types** — `Identifier`, `Document`, `DocumentCollection`, `PageSize`
//! - **Remote client** — `DocumentSource`, `DocumentHttpClient`
//! - **Orchestration** — `BatchFetchOrchestrator`, `orchestrate`, `FetchPlan`
//! - **Store** — `DocumentStore`, `FetchStatus`, `StoreEvent`
//! - **Collaborators** — `PrerequisiteFetcher`, `IdentifierSource`, `ErrorSink`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod prerequisites;
pub mod reporting;
pub mod store;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorKind, FetchFailure, RemoteFetchError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, FetchConfig};

// --- Domain Types ---
pub use crate::types::{Document, DocumentCollection, Identifier, PageSize};

// --- Remote Client ---
pub use crate::api::{client::ApiResponse, parser::parse_documents_response};
pub use crate::api::{DocumentHttpClient, DocumentSource};

// --- Orchestration ---
pub use crate::orchestrator::plan::{missing_identifiers, FetchPlan};
pub use crate::orchestrator::sequential::fetch_chunks_sequentially;
pub use crate::orchestrator::{orchestrate, BatchFetchOrchestrator};

// --- Store ---
pub use crate::store::{DocumentStore, FetchStatus, FetchTicket, StoreEvent};

// --- Collaborators ---
pub use crate::prerequisites::{
    run_in_sequence, IdentifierSource, PrerequisiteFetcher, ProjectSelections,
    ReportingPrerequisite, SlotSelection, StaticIdentifiers,
};
pub use crate::reporting::{
    fetch_documents_and_report_error, report_failure, ChannelErrorSink, ErrorEvent, ErrorSink,
    LogErrorSink,
};
