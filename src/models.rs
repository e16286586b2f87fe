//! Core data models used throughout jobfit.
//!
//! These types represent the chunks, retrieval candidates, and ranked results
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Which source document a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    Resume,
    Jd,
}

/// Per-chunk metadata attached at ingestion time.
///
/// `chunk_id` is the chunk's position within its section — stable inside a
/// section but not unique across documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChunkMeta {
    pub doc_type: DocType,
    pub section: Option<String>,
    pub chunk_id: i64,
}

/// A unit of retrievable text. Immutable once created; owned by the
/// [`DocumentStore`](crate::store::DocumentStore) for the lifetime of one
/// analysis session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub meta: ChunkMeta,
}

/// Which retrieval signal produced a candidate.
///
/// Lexical and vector scores live on different scales and are never compared
/// numerically with each other; the reranker is the only stage that unifies
/// them into one comparable score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Lexical,
    Vector,
}

/// A retrieval candidate produced by one signal source, pre-merge.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub meta: ChunkMeta,
    pub score: f32,
    pub source: CandidateSource,
}

/// Which scoring stage produced a [`RankedResult`]'s score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreKind {
    /// Cross-encoder relevance score; comparable across all results.
    #[serde(rename = "reranker")]
    Reranker,
    /// The raw score from whichever source supplied the candidate. Not
    /// comparable across sources.
    #[serde(rename = "bm25_or_vec")]
    BmOrVec,
}

/// A ranked result returned to the caller. Read-only.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub text: String,
    pub meta: ChunkMeta,
    pub section: Option<String>,
    pub score: f32,
    pub score_kind: ScoreKind,
}
