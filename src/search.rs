//! Hybrid retrieval over one document's corpus.
//!
//! Combines BM25 lexical ranking with vector similarity, merges and
//! deduplicates the two candidate lists, and optionally reranks the pool with
//! a cross-encoder. The pipeline degrades rather than fails: a broken vector
//! backend costs the vector signal, an unavailable reranker costs the rerank
//! pass, and an empty corpus yields an empty result — none of these abort a
//! request. Every swallowed failure is logged.
//!
//! Raw lexical and vector scores live on different scales. They are carried
//! through the merge for provenance but are never compared with each other;
//! only the reranker produces scores comparable across both signals. Results
//! from the unreranked path keep the heterogeneous source score, and callers
//! must not compare those across sources.

use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::embedding::embed_query;
use crate::lexical::{rank_top_k, BmIndex};
use crate::models::{Candidate, CandidateSource, ChunkMeta, RankedResult, ScoreKind};
use crate::rerank::{rerank, Reranker};
use crate::store::DocumentStore;
use crate::vector::VectorIndex;

/// One document's retrieval state: the chunk store plus its precomputed
/// embeddings. Built once per analysis session and replaced wholesale by the
/// next one.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    pub store: DocumentStore,
    pub vectors: VectorIndex,
}

/// Knobs for one retrieval call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum results returned.
    pub top_k: usize,
    /// Lexical candidates fed into the merge.
    pub bm25_k: usize,
    /// Vector candidates fed into the merge.
    pub vec_k: usize,
    /// Whether to run the cross-encoder pass.
    pub use_rerank: bool,
    /// Restrict retrieval to chunks tagged with this section.
    pub section_filter: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            bm25_k: 20,
            vec_k: 20,
            use_rerank: true,
            section_filter: None,
        }
    }
}

impl SearchOptions {
    pub fn from_config(retrieval: &crate::config::RetrievalConfig) -> Self {
        Self {
            top_k: retrieval.top_k,
            bm25_k: retrieval.bm25_k,
            vec_k: retrieval.vec_k,
            use_rerank: retrieval.use_rerank,
            section_filter: None,
        }
    }

    pub fn with_section(mut self, section: &str) -> Self {
        self.section_filter = Some(section.to_string());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Merge lexical and vector candidates into one deduplicated pool.
///
/// Lexical candidates come first, so on duplicate text the lexical entry
/// wins. The pool is capped at `max(top_k * 2, top_k)` to bound reranker
/// work regardless of corpus size. Two empty inputs merge to an empty pool;
/// that is not an error.
pub fn merge_candidates(
    lexical: Vec<Candidate>,
    vector: Vec<Candidate>,
    top_k: usize,
) -> Vec<Candidate> {
    let cap = (top_k * 2).max(top_k);
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut unique: Vec<Candidate> = Vec::new();

    for candidate in lexical.into_iter().chain(vector) {
        if unique.len() >= cap {
            break;
        }
        if seen.insert(candidate.text.clone()) {
            unique.push(candidate);
        }
    }

    unique
}

/// Search one document's corpus with both retrieval signals.
///
/// This is the single public entry point the chat and gap-analysis layers
/// call. The result list is at most `top_k` long, contains no duplicate
/// texts, and — when a section filter is given — only chunks from that
/// section. See the module docs for the degradation rules.
pub async fn hybrid_search(
    query: &str,
    index: &DocIndex,
    embedding: &EmbeddingConfig,
    reranker: &dyn Reranker,
    opts: &SearchOptions,
) -> Vec<RankedResult> {
    let section = opts.section_filter.as_deref();

    // Corpus selection. An empty corpus (or one the filter empties) is a
    // terminal no-result state, not an error.
    let corpus = index.store.filtered(section);
    if corpus.is_empty() {
        debug!(section = ?section, "retrieval corpus is empty");
        return Vec::new();
    }

    // Lexical ranking over the filtered corpus.
    let texts: Vec<&str> = corpus.iter().map(|c| c.text.as_str()).collect();
    let bm25 = BmIndex::build(&texts);
    let scores = bm25.scores(query);
    let lexical: Vec<Candidate> = rank_top_k(&scores, opts.bm25_k)
        .into_iter()
        .map(|i| Candidate {
            text: corpus[i].text.clone(),
            meta: corpus[i].meta.clone(),
            score: scores[i],
            source: CandidateSource::Lexical,
        })
        .collect();

    // Vector ranking. Any failure here degrades to an empty vector list so
    // the lexical signal still produces results.
    let vector = vector_candidates(query, index, embedding, opts.vec_k, section).await;

    let merged = merge_candidates(lexical, vector, opts.top_k);

    if opts.use_rerank {
        let candidate_texts: Vec<String> = merged.iter().map(|c| c.text.clone()).collect();
        match rerank(reranker, query, &candidate_texts, opts.top_k).await {
            Ok(scored) => {
                return scored
                    .into_iter()
                    .map(|doc| {
                        let meta = merged
                            .iter()
                            .find(|c| c.text == doc.text)
                            .map(|c| c.meta.clone())
                            .unwrap_or_else(ChunkMeta::default);
                        RankedResult {
                            section: meta.section.clone(),
                            text: doc.text,
                            meta,
                            score: doc.score,
                            score_kind: ScoreKind::Reranker,
                        }
                    })
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "rerank unavailable; falling back to merged ranking");
            }
        }
    }

    // Raw path: first top_k of the merged pool in merge order, carrying the
    // score from whichever source supplied each candidate.
    merged
        .into_iter()
        .take(opts.top_k)
        .map(|c| RankedResult {
            section: c.meta.section.clone(),
            text: c.text,
            meta: c.meta,
            score: c.score,
            score_kind: ScoreKind::BmOrVec,
        })
        .collect()
}

async fn vector_candidates(
    query: &str,
    index: &DocIndex,
    embedding: &EmbeddingConfig,
    vec_k: usize,
    section: Option<&str>,
) -> Vec<Candidate> {
    if index.vectors.is_empty() {
        debug!("vector index is empty; skipping vector signal");
        return Vec::new();
    }

    let query_vec = match embed_query(embedding, query).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "query embedding failed; continuing with lexical results only");
            return Vec::new();
        }
    };

    match index
        .vectors
        .similarity_query(&index.store, &query_vec, vec_k, section)
    {
        Ok(hits) => hits
            .into_iter()
            .map(|hit| Candidate {
                text: hit.chunk.text.clone(),
                meta: hit.chunk.meta.clone(),
                score: hit.distance,
                source: CandidateSource::Vector,
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "vector search failed; continuing with lexical results only");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hash_embed;
    use crate::models::{Chunk, DocType};
    use crate::rerank::DisabledReranker;
    use anyhow::Result;
    use async_trait::async_trait;

    const DIMS: usize = 128;

    fn hash_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "hash".to_string(),
            dims: Some(DIMS),
            ..EmbeddingConfig::default()
        }
    }

    fn disabled_config() -> EmbeddingConfig {
        EmbeddingConfig::default()
    }

    fn build_index(texts: &[(&str, &str)]) -> DocIndex {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, (text, section))| Chunk {
                text: text.to_string(),
                meta: ChunkMeta {
                    doc_type: DocType::Resume,
                    section: Some(section.to_string()),
                    chunk_id: i as i64,
                },
            })
            .collect();
        let embeddings = chunks.iter().map(|c| hash_embed(&c.text, DIMS)).collect();
        let store = DocumentStore::new(chunks);
        let vectors = VectorIndex::from_embeddings(&store, embeddings).unwrap();
        DocIndex { store, vectors }
    }

    fn candidate(text: &str, score: f32, source: CandidateSource) -> Candidate {
        Candidate {
            text: text.to_string(),
            meta: ChunkMeta::default(),
            score,
            source,
        }
    }

    /// Reranker that scores candidates by a fixed text → score table.
    struct TableReranker(Vec<(&'static str, f32)>);

    #[async_trait]
    impl Reranker for TableReranker {
        async fn score_pairs(&self, _query: &str, docs: &[String]) -> Result<Vec<f32>> {
            Ok(docs
                .iter()
                .map(|d| {
                    self.0
                        .iter()
                        .find(|(text, _)| *text == d.as_str())
                        .map(|(_, s)| *s)
                        .unwrap_or(0.0)
                })
                .collect())
        }
    }

    fn raw_opts(top_k: usize) -> SearchOptions {
        SearchOptions {
            top_k,
            use_rerank: false,
            ..SearchOptions::default()
        }
    }

    // ---- merge ----

    #[test]
    fn test_merge_dedups_first_occurrence_wins() {
        let lexical = vec![candidate("shared", 3.0, CandidateSource::Lexical)];
        let vector = vec![
            candidate("shared", 0.1, CandidateSource::Vector),
            candidate("only vector", 0.2, CandidateSource::Vector),
        ];
        let merged = merge_candidates(lexical, vector, 5);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "shared");
        assert_eq!(merged[0].source, CandidateSource::Lexical);
        assert!((merged[0].score - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_merge_caps_pool_at_twice_top_k() {
        let lexical: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("lex {i}"), 1.0, CandidateSource::Lexical))
            .collect();
        let vector: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("vec {i}"), 0.5, CandidateSource::Vector))
            .collect();
        let merged = merge_candidates(lexical, vector, 3);
        assert_eq!(merged.len(), 6);
        assert!(merged.iter().take(6).all(|c| c.text.starts_with("lex")));
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge_candidates(Vec::new(), Vec::new(), 5).is_empty());
    }

    // ---- façade ----

    #[tokio::test]
    async fn test_empty_corpus_returns_empty() {
        let index = DocIndex::default();
        let results =
            hybrid_search("anything", &index, &hash_config(), &DisabledReranker, &raw_opts(5))
                .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_lexical_match_wins_without_rerank() {
        let index = build_index(&[
            ("Python developer", "skills"),
            ("Java developer", "skills"),
            ("Docker and Kubernetes", "skills"),
        ]);
        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &raw_opts(1)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "Python developer");
        assert_eq!(results[0].score_kind, ScoreKind::BmOrVec);
    }

    #[tokio::test]
    async fn test_no_duplicate_texts_in_results() {
        // The same text ranks in both the lexical and vector lists; it must
        // appear exactly once in the output.
        let index = build_index(&[
            ("rust systems programming", "skills"),
            ("unrelated gardening notes", "other"),
        ]);
        let results = hybrid_search(
            "rust systems",
            &index,
            &hash_config(),
            &DisabledReranker,
            &raw_opts(5),
        )
        .await;
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        let unique: std::collections::HashSet<&str> = texts.iter().copied().collect();
        assert_eq!(unique.len(), texts.len());
        assert_eq!(
            results
                .iter()
                .filter(|r| r.text == "rust systems programming")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_section_filter_invariant() {
        let index = build_index(&[
            ("python and docker", "skills"),
            ("python scraper with asyncio", "projects"),
            ("bachelor of science", "education"),
        ]);
        let opts = raw_opts(5).with_section("projects");
        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &opts).await;
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|r| r.section.as_deref() == Some("projects")));
    }

    #[tokio::test]
    async fn test_filter_with_no_matches_is_terminal() {
        let index = build_index(&[("python", "skills")]);
        let opts = raw_opts(5).with_section("experience");
        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &opts).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_top_k_bound() {
        let index = build_index(&[
            ("python one", "skills"),
            ("python two", "skills"),
            ("python three", "skills"),
            ("python four", "skills"),
        ]);
        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &raw_opts(2)).await;
        assert!(results.len() <= 2);
    }

    #[tokio::test]
    async fn test_degrades_to_lexical_when_embedding_fails() {
        // Embeddings exist in the index, but query embedding is disabled and
        // errors. Lexical results must still come back.
        let index = build_index(&[("python developer", "skills"), ("java", "skills")]);
        let results = hybrid_search(
            "python",
            &index,
            &disabled_config(),
            &DisabledReranker,
            &raw_opts(2),
        )
        .await;
        assert!(!results.is_empty());
        assert_eq!(results[0].text, "python developer");
    }

    #[tokio::test]
    async fn test_degrades_to_lexical_on_dimension_mismatch() {
        // Index built at a different dimensionality than the query embedding
        // produces a vector backend error, which must not abort the call.
        let chunks = vec![Chunk {
            text: "python developer".to_string(),
            meta: ChunkMeta::default(),
        }];
        let embeddings = vec![hash_embed("python developer", DIMS / 2)];
        let store = DocumentStore::new(chunks);
        let vectors = VectorIndex::from_embeddings(&store, embeddings).unwrap();
        let index = DocIndex { store, vectors };

        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &raw_opts(1)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "python developer");
    }

    #[tokio::test]
    async fn test_rerank_orders_by_model_score() {
        let index = build_index(&[
            ("candidate a", "other"),
            ("candidate b", "other"),
            ("candidate c", "other"),
        ]);
        let reranker = TableReranker(vec![
            ("candidate a", 0.9),
            ("candidate b", 0.7),
            ("candidate c", 0.5),
        ]);
        let opts = SearchOptions {
            top_k: 3,
            use_rerank: true,
            ..SearchOptions::default()
        };
        let results = hybrid_search("query", &index, &hash_config(), &reranker, &opts).await;
        let order: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(order, vec!["candidate a", "candidate b", "candidate c"]);
        assert!(results.iter().all(|r| r.score_kind == ScoreKind::Reranker));
        assert!(results[0].score > results[2].score);
    }

    #[tokio::test]
    async fn test_rerank_reattaches_metadata() {
        let index = build_index(&[("python and docker", "skills")]);
        let reranker = TableReranker(vec![("python and docker", 0.8)]);
        let opts = SearchOptions {
            top_k: 1,
            use_rerank: true,
            ..SearchOptions::default()
        };
        let results = hybrid_search("python", &index, &hash_config(), &reranker, &opts).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].meta.section.as_deref(), Some("skills"));
        assert_eq!(results[0].section.as_deref(), Some("skills"));
    }

    #[tokio::test]
    async fn test_rerank_failure_falls_back_to_raw_ranking() {
        let index = build_index(&[("python developer", "skills"), ("java", "skills")]);
        let opts = SearchOptions {
            top_k: 2,
            use_rerank: true,
            ..SearchOptions::default()
        };
        let results =
            hybrid_search("python", &index, &hash_config(), &DisabledReranker, &opts).await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.score_kind == ScoreKind::BmOrVec));
        assert_eq!(results[0].text, "python developer");
    }
}
