//! Fetch planning: which identifiers to request, and in which batches.

use crate::types::{Identifier, PageSize};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Identifiers in `required` that are not in `known`.
///
/// Duplicates in `required` contribute once and first-seen order is kept,
/// so the resulting batches are deterministic for a given input.
pub fn missing_identifiers<'a, I>(required: I, known: &HashSet<Identifier>) -> Vec<Identifier>
where
    I: IntoIterator<Item = &'a Identifier>,
{
    required
        .into_iter()
        .filter(|id| !known.contains(*id))
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Missing identifiers partitioned into contiguous batches of at most
/// `page_size` identifiers each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    identifiers: Vec<Identifier>,
    page_size: PageSize,
}

impl FetchPlan {
    pub fn new(missing: Vec<Identifier>, page_size: PageSize) -> Self {
        Self {
            identifiers: missing,
            page_size,
        }
    }

    /// Batches in request order. Only the last one may be short.
    pub fn chunks(&self) -> std::slice::Chunks<'_, Identifier> {
        self.identifiers.chunks(self.page_size.get())
    }

    pub fn chunk_count(&self) -> usize {
        self.identifiers.len().div_ceil(self.page_size.get())
    }

    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
