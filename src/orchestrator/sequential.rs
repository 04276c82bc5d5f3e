//! Sequential batch fetching over a [`FetchPlan`].

use super::plan::FetchPlan;
use crate::error::AppError;
use crate::types::{DocumentCollection, Identifier};

/// Fetches every batch of `plan` one after another and merges the results.
///
/// Batch `k + 1` is not requested until batch `k` has settled, so at most
/// one request is outstanding. The first failure aborts the loop and is
/// returned unchanged; whatever was accumulated up to that point is
/// dropped.
pub async fn fetch_chunks_sequentially<F, Fut>(
    plan: &FetchPlan,
    mut fetch_fn: F,
) -> Result<DocumentCollection, AppError>
where
    F: FnMut(usize, Vec<Identifier>) -> Fut,
    Fut: std::future::Future<Output = Result<DocumentCollection, AppError>>,
{
    let total = plan.chunk_count();
    let mut accumulated = DocumentCollection::with_capacity(plan.identifier_count());

    for (index, chunk) in plan.chunks().enumerate() {
        log::debug!(
            "Requesting batch {}/{} ({} identifiers)",
            index + 1,
            total,
            chunk.len()
        );

        let fetched = match fetch_fn(index, chunk.to_vec()).await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!(
                    "Batch {}/{} failed, abandoning remaining batches: {}",
                    index + 1,
                    total,
                    e
                );
                return Err(e);
            }
        };

        log::debug!(
            "Batch {}/{} returned {} documents",
            index + 1,
            total,
            fetched.len()
        );
        accumulated.merge(fetched);
    }

    Ok(accumulated)
}
