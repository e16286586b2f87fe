//! In-memory vector index over a document store.
//!
//! Holds one precomputed embedding per chunk, aligned with the store's
//! insertion order. Queries compute cosine distance in-process; the corpus is
//! a single resume or JD, so a linear scan is the whole index.

use anyhow::{bail, Result};

use crate::embedding::cosine_similarity;
use crate::models::Chunk;
use crate::store::DocumentStore;

/// A similarity hit: the chunk plus its cosine distance (lower = more
/// similar). Distances are only meaningful relative to other distances from
/// the same query; they are never compared against lexical scores.
#[derive(Debug)]
pub struct VectorHit<'a> {
    pub chunk: &'a Chunk,
    pub distance: f32,
}

/// Precomputed embeddings for one document store.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    /// `(chunk position in store, embedding)`, in store order.
    entries: Vec<(usize, Vec<f32>)>,
}

impl VectorIndex {
    /// An index with no vectors. Queries against it return no hits, which
    /// callers treat as the vector signal being unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from per-chunk embeddings aligned with the store's chunk order.
    ///
    /// # Errors
    ///
    /// Fails if the embedding count does not match the store's chunk count.
    pub fn from_embeddings(store: &DocumentStore, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if embeddings.len() != store.len() {
            bail!(
                "embedding count {} does not match chunk count {}",
                embeddings.len(),
                store.len()
            );
        }
        Ok(Self {
            entries: embeddings.into_iter().enumerate().collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest chunks to `query_vec` by cosine distance, optionally
    /// restricted to one section. Returns at most `k` hits, closest first.
    ///
    /// # Errors
    ///
    /// Fails on a query/index dimensionality mismatch. Callers absorb the
    /// error and continue without the vector signal.
    pub fn similarity_query<'a>(
        &self,
        store: &'a DocumentStore,
        query_vec: &[f32],
        k: usize,
        section_filter: Option<&str>,
    ) -> Result<Vec<VectorHit<'a>>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query_vec.is_empty() {
            bail!("empty query embedding");
        }
        if let Some((_, first)) = self.entries.first() {
            if first.len() != query_vec.len() {
                bail!(
                    "query dimensionality {} does not match index dimensionality {}",
                    query_vec.len(),
                    first.len()
                );
            }
        }

        let chunks = store.chunks();
        let mut hits: Vec<VectorHit<'a>> = self
            .entries
            .iter()
            .filter_map(|(pos, embedding)| {
                let chunk = chunks.get(*pos)?;
                if let Some(section) = section_filter {
                    if chunk.meta.section.as_deref() != Some(section) {
                        return None;
                    }
                }
                Some(VectorHit {
                    chunk,
                    distance: 1.0 - cosine_similarity(query_vec, embedding),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hash_embed;
    use crate::models::{ChunkMeta, DocType};

    const DIMS: usize = 128;

    fn store_with(texts: &[(&str, &str)]) -> (DocumentStore, VectorIndex) {
        let chunks: Vec<Chunk> = texts
            .iter()
            .map(|(text, section)| Chunk {
                text: text.to_string(),
                meta: ChunkMeta {
                    doc_type: DocType::Resume,
                    section: Some(section.to_string()),
                    chunk_id: 0,
                },
            })
            .collect();
        let embeddings = chunks.iter().map(|c| hash_embed(&c.text, DIMS)).collect();
        let store = DocumentStore::new(chunks);
        let index = VectorIndex::from_embeddings(&store, embeddings).unwrap();
        (store, index)
    }

    #[test]
    fn test_nearest_chunk_first() {
        let (store, index) = store_with(&[
            ("python machine learning models", "skills"),
            ("cooked pasta for the team offsite", "other"),
        ]);
        let query = hash_embed("python machine learning", DIMS);
        let hits = index.similarity_query(&store, &query, 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].chunk.text.contains("python"));
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_section_filter_restricts_hits() {
        let (store, index) = store_with(&[
            ("python docker", "skills"),
            ("python scraper project", "projects"),
        ]);
        let query = hash_embed("python", DIMS);
        let hits = index
            .similarity_query(&store, &query, 5, Some("projects"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.meta.section.as_deref(), Some("projects"));
    }

    #[test]
    fn test_k_caps_results() {
        let (store, index) = store_with(&[
            ("alpha", "other"),
            ("beta", "other"),
            ("gamma", "other"),
        ]);
        let query = hash_embed("alpha", DIMS);
        let hits = index.similarity_query(&store, &query, 2, None).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_empty_index_returns_no_hits() {
        let store = DocumentStore::default();
        let index = VectorIndex::empty();
        let query = hash_embed("anything", DIMS);
        let hits = index.similarity_query(&store, &query, 3, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let (store, index) = store_with(&[("text", "other")]);
        let query = hash_embed("text", DIMS / 2);
        assert!(index.similarity_query(&store, &query, 1, None).is_err());
    }

    #[test]
    fn test_mismatched_embedding_count_rejected() {
        let (store, _) = store_with(&[("a", "other"), ("b", "other")]);
        let result = VectorIndex::from_embeddings(&store, vec![vec![0.0; DIMS]]);
        assert!(result.is_err());
    }
}
