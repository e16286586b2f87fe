//! Cross-encoder reranking.
//!
//! A second-pass relevance scorer over the merged candidate pool. Each
//! `(query, candidate)` pair gets one score from a cross-encoder model; the
//! scores from this stage are the only ones comparable across both retrieval
//! signals.
//!
//! Implementations:
//! - **[`DisabledReranker`]** — returns errors; callers fall back to the raw
//!   merged ranking.
//! - **[`TeiReranker`]** — calls a `text-embeddings-inference` style
//!   `POST /rerank` endpoint, scoring all pairs in one batched request.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::RerankConfig;

/// A reranked document with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub text: String,
    pub score: f32,
}

/// Trait for cross-encoder relevance scorers.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Scores for each `(query, doc)` pair, aligned with `docs` order.
    async fn score_pairs(&self, query: &str, docs: &[String]) -> Result<Vec<f32>>;
}

/// Rerank `docs` against `query`, returning at most `top_k` results sorted by
/// score descending. Equal scores keep their input order (stable sort), so
/// the merge order still breaks ties.
///
/// An empty candidate list returns empty without invoking the model.
///
/// # Errors
///
/// Propagates model failures; callers fall back to the unreranked ranking.
pub async fn rerank(
    reranker: &dyn Reranker,
    query: &str,
    docs: &[String],
    top_k: usize,
) -> Result<Vec<ScoredDoc>> {
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    let scores = reranker.score_pairs(query, docs).await?;
    if scores.len() != docs.len() {
        bail!(
            "reranker returned {} scores for {} documents",
            scores.len(),
            docs.len()
        );
    }

    let mut scored: Vec<ScoredDoc> = docs
        .iter()
        .zip(scores)
        .map(|(text, score)| ScoredDoc {
            text: text.clone(),
            score,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    Ok(scored)
}

// ============ Disabled Reranker ============

/// A reranker that always fails, used when no rerank backend is configured.
/// The retrieval pipeline treats the failure as "rerank unavailable" and
/// returns the raw merged ranking instead.
pub struct DisabledReranker;

#[async_trait]
impl Reranker for DisabledReranker {
    async fn score_pairs(&self, _query: &str, _docs: &[String]) -> Result<Vec<f32>> {
        bail!("Rerank provider is disabled")
    }
}

// ============ TEI Reranker ============

/// Reranker backed by a `text-embeddings-inference` compatible server.
///
/// Sends `POST {base_url}/rerank` with `{ "query": ..., "texts": [...] }`
/// and reads back `[{ "index": n, "score": s }, ...]`.
pub struct TeiReranker {
    base_url: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct TeiRank {
    index: usize,
    score: f32,
}

impl TeiReranker {
    /// # Errors
    ///
    /// Fails when `base_url` is missing from the configuration.
    pub fn new(config: &RerankConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("rerank.base_url required for TEI provider"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Reranker for TeiReranker {
    async fn score_pairs(&self, query: &str, docs: &[String]) -> Result<Vec<f32>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "query": query,
            "texts": docs,
        });

        let response = client
            .post(format!("{}/rerank", self.base_url))
            .json(&body)
            .send()
            .await
            .context("rerank request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("rerank API error {}: {}", status, body_text);
        }

        let ranks: Vec<TeiRank> = response
            .json()
            .await
            .context("invalid rerank response body")?;

        // The server returns pairs sorted by score; realign to input order.
        let mut scores = vec![0.0f32; docs.len()];
        for rank in ranks {
            if rank.index >= scores.len() {
                bail!("rerank response index {} out of range", rank.index);
            }
            scores[rank.index] = rank.score;
        }
        Ok(scores)
    }
}

/// Create the appropriate [`Reranker`] based on configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or a TEI provider with no
/// `base_url`.
pub fn create_reranker(config: &RerankConfig) -> Result<Box<dyn Reranker>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledReranker)),
        "tei" => Ok(Box::new(TeiReranker::new(config)?)),
        other => bail!("Unknown rerank provider: {}", other),
    }
}
