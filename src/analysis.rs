//! Resume / JD gap analysis.
//!
//! Orchestrates the full analysis over one session: whole-document
//! similarity, weighted per-section retrieval from both documents, skill-list
//! extraction and comparison, and an optional LLM-written narrative grounded
//! in the retrieved chunks.
//!
//! Every stage degrades independently: no embeddings means no similarity
//! score, an unavailable reranker means raw-ranked context, and a failed LLM
//! call means the report ships without the narrative. The skill comparison is
//! pure computation and always present.

use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::ingest::Session;
use crate::llm;
use crate::models::RankedResult;
use crate::rerank::Reranker;
use crate::search::{hybrid_search, DocIndex, SearchOptions};
use crate::similarity::compute_similarity;

/// Marker returned instead of an empty context so downstream prompt assembly
/// can state the absence explicitly.
pub const NO_CONTEXT: &str = "No matching context found.";

/// Pure set comparison of the two documents' skill lists.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SkillComparison {
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
}

/// The full analysis result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub similarity_score: Option<f32>,
    pub match_score: Option<f32>,
    pub skills: SkillComparison,
    pub resume_chunks: Vec<RankedResult>,
    pub jd_chunks: Vec<RankedResult>,
    pub llm_analysis: Option<String>,
}

/// Per-section retrieval plan: `(section, query, top_k)`.
const RESUME_PLAN: &[(&str, &str, usize)] = &[
    ("skills", "technical skills from resume", 3),
    ("experience", "work experience achievements", 3),
    ("projects", "important projects", 2),
];

const JD_PLAN: &[(&str, &str, usize)] = &[
    ("requirements", "required skills job requirements", 4),
    ("responsibilities", "responsibilities tasks", 3),
];

/// Run the complete gap analysis for one session.
pub async fn run_gap_analysis(
    config: &Config,
    session: &Session,
    reranker: &dyn Reranker,
) -> AnalysisReport {
    let similarity =
        compute_similarity(&config.embedding, &session.resume_text, &session.jd_text).await;

    let resume_chunks = retrieve_weighted(config, &session.resume, reranker, RESUME_PLAN).await;
    let mut jd_chunks = retrieve_weighted(config, &session.jd, reranker, JD_PLAN).await;

    // JDs without recognizable requirement sections fall back to an
    // unfiltered pass so the comparison still has material to work with.
    if jd_chunks.len() < 2 {
        let query = llm::expand_query(&config.llm, "skills technologies job description").await;
        let opts = SearchOptions::from_config(&config.retrieval).with_top_k(2);
        for result in hybrid_search(&query, &session.jd, &config.embedding, reranker, &opts).await {
            if !jd_chunks.iter().any(|c| c.text == result.text) {
                jd_chunks.push(result);
            }
        }
    }

    let skills = compare_skill_lists(
        &extract_skill_list(&resume_chunks, &["skills"]),
        &extract_skill_list(&jd_chunks, &["skills", "requirements"]),
    );

    let llm_analysis = generate_narrative(
        config,
        similarity.as_ref().map(|s| (s.similarity, s.match_score)),
        &resume_chunks,
        &jd_chunks,
    )
    .await;

    AnalysisReport {
        similarity_score: similarity.map(|s| s.similarity),
        match_score: similarity.map(|s| s.match_score),
        skills,
        resume_chunks,
        jd_chunks,
        llm_analysis,
    }
}

/// Retrieve context section by section, deduplicating across sections by
/// chunk text.
async fn retrieve_weighted(
    config: &Config,
    index: &DocIndex,
    reranker: &dyn Reranker,
    plan: &[(&str, &str, usize)],
) -> Vec<RankedResult> {
    let mut collected: Vec<RankedResult> = Vec::new();

    for (section, query, top_k) in plan {
        let query = llm::expand_query(&config.llm, query).await;
        let opts = SearchOptions::from_config(&config.retrieval)
            .with_section(section)
            .with_top_k(*top_k);

        for result in hybrid_search(&query, index, &config.embedding, reranker, &opts).await {
            if !collected.iter().any(|c| c.text == result.text) {
                collected.push(result);
            }
        }
    }

    collected
}

/// Pull a flat skill list out of chunks from the given sections: one entry
/// per comma- or newline-separated token. Resumes list skills under
/// "skills"; JDs usually put them under "requirements".
pub fn extract_skill_list(chunks: &[RankedResult], sections: &[&str]) -> Vec<String> {
    chunks
        .iter()
        .filter(|c| {
            c.section
                .as_deref()
                .is_some_and(|s| sections.contains(&s))
        })
        .flat_map(|c| c.text.split(['\n', ',']))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize one skill entry for comparison. Strips list dashes, label
/// prefixes like "Programming languages:", and filler entries.
fn normalize_skill(skill: &str) -> String {
    let mut s = skill.trim().to_lowercase();

    if let Some(stripped) = s.strip_prefix('-') {
        s = stripped.trim().to_string();
    }

    if let Some((prefix, rest)) = s.split_once(':') {
        if ["programming", "framework", "library"]
            .iter()
            .any(|label| prefix.contains(label))
        {
            s = rest.trim().to_string();
        }
    }

    if s == "preferred" || s == "preferred:" {
        return String::new();
    }

    s
}

/// Compare two skill lists as normalized sets: matched (both), missing (JD
/// only), extra (resume only). Output is sorted for stable presentation.
pub fn compare_skill_lists(resume_skills: &[String], jd_skills: &[String]) -> SkillComparison {
    let resume_set: std::collections::BTreeSet<String> = resume_skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect();
    let jd_set: std::collections::BTreeSet<String> = jd_skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect();

    SkillComparison {
        matched_skills: resume_set.intersection(&jd_set).cloned().collect(),
        missing_skills: jd_set.difference(&resume_set).cloned().collect(),
        extra_skills: resume_set.difference(&jd_set).cloned().collect(),
    }
}

/// Render the retrieved chunks for prompt assembly, or the explicit
/// no-context marker when retrieval came back empty.
pub fn context_block(chunks: &[RankedResult]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }
    serde_json::to_string_pretty(chunks).unwrap_or_else(|_| NO_CONTEXT.to_string())
}

async fn generate_narrative(
    config: &Config,
    scores: Option<(f32, f32)>,
    resume_chunks: &[RankedResult],
    jd_chunks: &[RankedResult],
) -> Option<String> {
    if !config.llm.is_enabled() {
        return None;
    }

    let metadata = match scores {
        Some((similarity, match_score)) => format!(
            "{{ \"similarity_score\": {similarity:.4}, \"match_score_0_10\": {match_score:.2} }}"
        ),
        None => "{ \"similarity_score\": null }".to_string(),
    };

    let prompt = format!(
        "You are an ATS-grade AI Job Readiness Assistant.\n\n\
         You will receive:\n\
         - RESUME_CONTEXT: chunks from the candidate's resume\n\
         - JD_CONTEXT: chunks from the job description\n\
         - Similarity and match score metadata\n\n\
         Use ONLY the given context. Do NOT hallucinate skills or experience\n\
         that are not clearly present in the provided chunks.\n\n\
         RESUME_CONTEXT:\n{}\n\n\
         JD_CONTEXT:\n{}\n\n\
         METADATA:\n{}\n\n\
         Your Task:\n\
         1. Identify which skills or requirements in the JD_CONTEXT are NOT clearly present in RESUME_CONTEXT.\n\
         2. Briefly explain why those missing skills/requirements matter for this role.\n\
         3. Highlight the candidate's strongest matching points from the resume.\n\
         4. Suggest 2-3 concrete, actionable improvements (skills to learn, projects to add, how to rewrite resume).\n\
         5. Keep the output in clear paragraphs and bullet points. Do NOT output JSON.",
        context_block(resume_chunks),
        context_block(jd_chunks),
        metadata,
    );

    match llm::complete(&config.llm, &prompt, config.llm.max_tokens, 0.3).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "gap-analysis narrative failed; returning report without it");
            None
        }
    }
}
