//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! them top to bottom should tell you how the fetcher talks to the
//! backend and how it labels what it reports.

// ---------------------------------------------------------------------------
// Document endpoint boundaries
// ---------------------------------------------------------------------------

/// How many identifiers the document endpoint accepts per request.
///
/// The backend rejects larger batches, so every orchestration partitions
/// its missing identifiers into pages of at most this size.
pub const DOCUMENT_ENDPOINT_PAGE_SIZE: usize = 1000;

/// Path of the batch document endpoint, relative to the backend base URL.
pub const DOCUMENT_ENDPOINT_PATH: &str = "2/cards/";

/// Request body field carrying the identifiers of one batch.
pub const DOCUMENT_REQUEST_FIELD: &str = "card_identifiers";

/// Default transport timeout for a single batch request, in seconds.
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Error reporting
// ---------------------------------------------------------------------------

/// Source tag attached to error events raised by the document fetch flow.
pub const DOCUMENT_FETCH_SOURCE_TAG: &str = "cardDocuments/fetchCardDocuments";

/// Name given to failures that never reached the service (DNS, TLS, reset).
pub const NETWORK_ERROR_NAME: &str = "NetworkError";

/// Maximum characters shown when previewing unparseable response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Store notifications
// ---------------------------------------------------------------------------

/// Buffered store events per subscriber before slow receivers start lagging.
pub const STORE_EVENT_CAPACITY: usize = 64;
