//! Okapi BM25 lexical ranking.
//!
//! Builds a term-frequency index over a chunk corpus and scores a query
//! against every chunk. Tokenization is deliberately simple — lower-case,
//! whitespace split, no stemming, no stop-word removal — which keeps scores
//! reproducible at the cost of some recall on inflected forms.
//!
//! The index is cheap to build and is rebuilt per retrieval call over the
//! (possibly section-filtered) corpus; nothing here persists.

use std::collections::HashMap;

const K1: f32 = 1.5;
const B: f32 = 0.75;
/// Floor factor for terms present in most documents, whose raw IDF would go
/// negative. Matches the Okapi convention of clamping to a fraction of the
/// average IDF.
const EPSILON: f32 = 0.25;

/// Lower-case whitespace tokenizer shared by index build and query scoring.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// A BM25 index over one corpus. Scores are aligned positionally with the
/// corpus the index was built from.
#[derive(Debug)]
pub struct BmIndex {
    /// Per-document term counts.
    doc_freqs: Vec<HashMap<String, usize>>,
    /// Per-term inverse document frequency, floored as described on
    /// [`EPSILON`].
    idf: HashMap<String, f32>,
    doc_len: Vec<f32>,
    avgdl: f32,
}

impl BmIndex {
    /// Build an index from chunk texts. Callers short-circuit on an empty
    /// corpus before reaching here.
    pub fn build(corpus: &[&str]) -> Self {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|t| tokenize(t)).collect();

        let mut doc_freqs: Vec<HashMap<String, usize>> = Vec::with_capacity(tokenized.len());
        let mut term_docs: HashMap<String, usize> = HashMap::new();
        let mut doc_len: Vec<f32> = Vec::with_capacity(tokenized.len());

        for tokens in &tokenized {
            doc_len.push(tokens.len() as f32);
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *term_docs.entry(term.clone()).or_insert(0) += 1;
            }
            doc_freqs.push(freqs);
        }

        let total: f32 = doc_len.iter().sum();
        let avgdl = if doc_len.is_empty() {
            0.0
        } else {
            total / doc_len.len() as f32
        };

        let idf = compute_idf(&term_docs, tokenized.len());

        Self {
            doc_freqs,
            idf,
            doc_len,
            avgdl,
        }
    }

    /// BM25 scores for `query`, one per corpus document, aligned with the
    /// corpus order the index was built from. Higher is more relevant.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let query_tokens = tokenize(query);
        let mut scores = vec![0.0f32; self.doc_freqs.len()];

        for token in &query_tokens {
            let Some(&idf) = self.idf.get(token) else {
                continue;
            };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let freq = *freqs.get(token).unwrap_or(&0) as f32;
                if freq == 0.0 {
                    continue;
                }
                let denom = freq + K1 * (1.0 - B + B * self.doc_len[i] / self.avgdl);
                scores[i] += idf * freq * (K1 + 1.0) / denom;
            }
        }

        scores
    }
}

/// IDF per term: `ln((N - n + 0.5) / (n + 0.5))`, with negative values
/// (terms in more than half the corpus) floored to `EPSILON × average IDF`.
fn compute_idf(term_docs: &HashMap<String, usize>, n_docs: usize) -> HashMap<String, f32> {
    let n = n_docs as f32;
    let mut idf: HashMap<String, f32> = HashMap::with_capacity(term_docs.len());
    let mut idf_sum = 0.0f32;
    let mut negative: Vec<&str> = Vec::new();

    for (term, &docs_with_term) in term_docs {
        let freq = docs_with_term as f32;
        let value = ((n - freq + 0.5) / (freq + 0.5)).ln();
        idf_sum += value;
        if value < 0.0 {
            negative.push(term);
        }
        idf.insert(term.clone(), value);
    }

    if !term_docs.is_empty() {
        let average_idf = idf_sum / term_docs.len() as f32;
        let floor = EPSILON * average_idf;
        for term in negative {
            idf.insert(term.to_string(), floor);
        }
    }

    idf
}

/// Indices of the top `k` scores, descending. The sort is stable, so equal
/// scores keep their corpus order.
pub fn rank_top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(k);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Python  Developer\nDocker"),
            vec!["python", "developer", "docker"]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_query_term_match_ranks_first() {
        let corpus = ["Python developer", "Java developer", "Docker and Kubernetes"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("python");

        assert_eq!(scores.len(), 3);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);

        let ranked = rank_top_k(&scores, 1);
        assert_eq!(ranked, vec![0]);
    }

    #[test]
    fn test_scores_align_with_corpus_positions() {
        let corpus = ["alpha beta", "gamma delta", "alpha gamma"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("delta");
        assert_eq!(scores.len(), 3);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_common_terms_get_floored_idf() {
        // "developer" appears in 2 of 3 documents; its raw IDF is negative
        // and must be floored to a small positive value.
        let corpus = ["python developer", "java developer", "docker kubernetes"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("developer");
        assert!(scores[0] > 0.0);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_rank_ties_keep_corpus_order() {
        // Identical documents score identically; stable sort keeps original
        // positions.
        let corpus = ["rust tokio", "rust tokio", "python"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("rust");
        assert!((scores[0] - scores[1]).abs() < 1e-6);

        let ranked = rank_top_k(&scores, 3);
        assert_eq!(ranked, vec![0, 1, 2]);
    }

    #[test]
    fn test_term_frequency_raises_score() {
        let corpus = ["go go go building compilers", "go once", "python ruby"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("go");
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_unknown_query_terms_score_zero() {
        let corpus = ["alpha beta"];
        let index = BmIndex::build(&corpus);
        let scores = index.scores("zeta");
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn test_rank_top_k_truncates() {
        let scores = vec![0.1, 0.9, 0.5, 0.7];
        assert_eq!(rank_top_k(&scores, 2), vec![1, 3]);
        assert_eq!(rank_top_k(&scores, 10), vec![1, 3, 2, 0]);
    }
}
