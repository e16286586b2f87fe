//! In-memory per-session document store.
//!
//! Holds the chunks of one source document (resume or JD) for the lifetime of
//! a single analysis session. A new analysis builds a fresh store and swaps
//! it in wholesale — stores are never mutated after construction, so readers
//! holding the previous store are unaffected by a new submission.

use crate::models::Chunk;

/// Chunk storage for one document, in insertion order.
///
/// Insertion order carries no ranking meaning; consumers rank explicitly.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    chunks: Vec<Chunk>,
}

impl DocumentStore {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunks whose section matches `section_filter`, or every chunk when no
    /// filter is given. An empty store yields an empty list; this is not an
    /// error.
    pub fn filtered(&self, section_filter: Option<&str>) -> Vec<&Chunk> {
        self.chunks
            .iter()
            .filter(|c| match section_filter {
                Some(section) => c.meta.section.as_deref() == Some(section),
                None => true,
            })
            .collect()
    }

}
