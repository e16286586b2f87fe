//! Analysis session ingestion.
//!
//! Turns raw resume and JD text into a [`Session`]: clean → section split →
//! chunk → embed → per-document store and vector index. A session is built
//! once per analysis submission and replaced wholesale by the next one;
//! nothing in it is mutated after construction.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::chunk::chunk_section;
use crate::config::Config;
use crate::embedding::embed_texts;
use crate::models::{Chunk, DocType};
use crate::search::DocIndex;
use crate::sections::{basic_clean, split_into_sections};
use crate::store::DocumentStore;
use crate::vector::VectorIndex;

/// One analysis request's retrieval state: both document indexes plus the
/// cleaned source texts.
#[derive(Debug, Clone)]
pub struct Session {
    pub resume: DocIndex,
    pub jd: DocIndex,
    pub resume_text: String,
    pub jd_text: String,
    pub created_at: DateTime<Utc>,
}

/// Clean a raw document and cut it into section-labeled chunks.
pub fn chunk_document(doc_type: DocType, raw_text: &str) -> Vec<Chunk> {
    let cleaned = basic_clean(raw_text);
    split_into_sections(&cleaned)
        .iter()
        .flat_map(|(section, body)| chunk_section(doc_type, section, body))
        .collect()
}

/// Build a fresh session from raw resume and JD text.
///
/// Embedding failures degrade to an empty vector index for the affected
/// document (retrieval then runs lexical-only); they never fail the build.
pub async fn build_session(config: &Config, resume_text: &str, jd_text: &str) -> Session {
    let resume_text = basic_clean(resume_text);
    let jd_text = basic_clean(jd_text);

    let resume = build_doc_index(config, DocType::Resume, &resume_text).await;
    let jd = build_doc_index(config, DocType::Jd, &jd_text).await;

    debug!(
        resume_chunks = resume.store.len(),
        jd_chunks = jd.store.len(),
        "session built"
    );

    Session {
        resume,
        jd,
        resume_text,
        jd_text,
        created_at: Utc::now(),
    }
}

async fn build_doc_index(config: &Config, doc_type: DocType, cleaned_text: &str) -> DocIndex {
    let chunks = chunk_document(doc_type, cleaned_text);
    let store = DocumentStore::new(chunks);

    if !config.embedding.is_enabled() || store.is_empty() {
        return DocIndex {
            store,
            vectors: VectorIndex::empty(),
        };
    }

    let vectors = match embed_store(config, &store).await {
        Ok(vectors) => vectors,
        Err(e) => {
            warn!(
                error = %e,
                doc_type = ?doc_type,
                "chunk embedding failed; retrieval will be lexical-only for this document"
            );
            VectorIndex::empty()
        }
    };

    DocIndex { store, vectors }
}

/// Embed every chunk in batches of `embedding.batch_size`.
async fn embed_store(config: &Config, store: &DocumentStore) -> anyhow::Result<VectorIndex> {
    let texts: Vec<String> = store.chunks().iter().map(|c| c.text.clone()).collect();
    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for batch in texts.chunks(config.embedding.batch_size.max(1)) {
        embeddings.extend(embed_texts(&config.embedding, batch).await?);
    }

    VectorIndex::from_embeddings(store, embeddings)
}
