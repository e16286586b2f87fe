//! Chat query intent detection.
//!
//! Classifies a chat message as being about the resume, the job description,
//! or both, so retrieval only touches the relevant store. Keyword matching is
//! intentional: queries here are short and the vocabulary is narrow, and a
//! misclassification only widens or narrows retrieval, never breaks it.

use serde::Serialize;

/// Which document(s) a chat query is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryTarget {
    Resume,
    Jd,
    Both,
    Unknown,
}

const RESUME_KEYWORDS: &[&str] = &[
    "my resume",
    "resume",
    "cv",
    "profile",
    "improve my",
    "fix my",
    "update resume",
    "improve summary",
    "improve my summary",
];

const JD_KEYWORDS: &[&str] = &[
    "jd",
    "job description",
    "job role",
    "backend role",
    "frontend role",
    "am i ready for",
    "requirements for",
    "skills for",
];

const BOTH_KEYWORDS: &[&str] = &[
    "compare",
    "match",
    "difference",
    "gap",
    "missing",
    "skills i lack",
    "what am i missing",
];

/// Classify a user query as resume / jd / both / unknown.
pub fn detect_query_target(query: &str) -> QueryTarget {
    let q = query.to_lowercase();

    if BOTH_KEYWORDS.iter().any(|k| q.contains(k)) {
        return QueryTarget::Both;
    }

    let resume_hit = RESUME_KEYWORDS.iter().any(|k| q.contains(k));
    let jd_hit = JD_KEYWORDS.iter().any(|k| q.contains(k));

    match (resume_hit, jd_hit) {
        (true, true) => QueryTarget::Both,
        (true, false) => QueryTarget::Resume,
        (false, true) => QueryTarget::Jd,
        (false, false) => QueryTarget::Unknown,
    }
}

/// Classification used for retrieval: unknown queries default to the resume,
/// which is what users most often mean.
pub fn target_for_retrieval(query: &str) -> QueryTarget {
    match detect_query_target(query) {
        QueryTarget::Unknown => QueryTarget::Resume,
        target => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_queries() {
        assert_eq!(
            detect_query_target("how can I improve my resume?"),
            QueryTarget::Resume
        );
        assert_eq!(detect_query_target("fix my summary in the CV"), QueryTarget::Resume);
    }

    #[test]
    fn test_jd_queries() {
        assert_eq!(
            detect_query_target("what are the requirements for this job role?"),
            QueryTarget::Jd
        );
    }

    #[test]
    fn test_both_keywords_win() {
        // "gap" outranks the resume keyword also present in the query.
        assert_eq!(
            detect_query_target("what is the gap between my resume and the jd?"),
            QueryTarget::Both
        );
        assert_eq!(detect_query_target("compare the two"), QueryTarget::Both);
    }

    #[test]
    fn test_resume_and_jd_hits_mean_both() {
        assert_eq!(
            detect_query_target("does my resume fit the job description?"),
            QueryTarget::Both
        );
    }

    #[test]
    fn test_unknown_defaults_to_resume_for_retrieval() {
        assert_eq!(detect_query_target("tell me about python"), QueryTarget::Unknown);
        assert_eq!(target_for_retrieval("tell me about python"), QueryTarget::Resume);
    }
}
