use crate::error::FetchFailure;
use serde::{Deserialize, Serialize};

/// Status transition published by the store.
///
/// `generation` identifies the orchestration; observers that only care
/// about the latest run can drop events from older generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    Pending { generation: u64 },
    Fulfilled { generation: u64, fetched: usize },
    Rejected { generation: u64, failure: FetchFailure },
}
