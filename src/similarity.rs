//! Whole-document similarity scoring.
//!
//! Embeds the full resume and JD texts and reports their cosine similarity
//! plus a 0–10 match score shown to the user. Degrades to `None` when the
//! embedding provider is disabled or fails; the rest of the analysis does not
//! depend on it.

use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::embedding::{cosine_similarity, embed_texts};

/// Similarity between the two source documents.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SimilarityScore {
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f32,
    /// `similarity × 10`, rounded to two decimals.
    pub match_score: f32,
}

/// Compute the resume/JD similarity, or `None` when embeddings are
/// unavailable.
pub async fn compute_similarity(
    config: &EmbeddingConfig,
    resume_text: &str,
    jd_text: &str,
) -> Option<SimilarityScore> {
    if !config.is_enabled() {
        return None;
    }
    if resume_text.trim().is_empty() || jd_text.trim().is_empty() {
        return None;
    }

    let texts = vec![resume_text.to_string(), jd_text.to_string()];
    match embed_texts(config, &texts).await {
        Ok(vectors) if vectors.len() == 2 => {
            let similarity = cosine_similarity(&vectors[0], &vectors[1]);
            Some(SimilarityScore {
                similarity,
                match_score: (similarity * 10.0 * 100.0).round() / 100.0,
            })
        }
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "document similarity scoring failed");
            None
        }
    }
}
