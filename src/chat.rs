//! Chat over an analyzed session.
//!
//! Grounds a conversational assistant in the session's resume and JD chunks:
//! the user message is rewritten into a stand-alone query (resolving
//! pronouns against recent history), classified by intent, and answered from
//! hybrid retrieval over the targeted document(s). Context that cannot be
//! found is reported with an explicit marker instead of being silently
//! omitted.

use serde::Serialize;
use tracing::warn;

use crate::analysis::NO_CONTEXT;
use crate::config::Config;
use crate::ingest::Session;
use crate::intent::{target_for_retrieval, QueryTarget};
use crate::llm;
use crate::models::RankedResult;
use crate::rerank::Reranker;
use crate::search::{hybrid_search, SearchOptions};

/// Chunks retrieved per targeted document for one chat turn.
const CHAT_TOP_K: usize = 3;

/// Messages of history kept per session.
pub const HISTORY_LIMIT: usize = 12;

/// One chat transcript entry.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Retrieval output for one chat turn, kept for response transparency.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: Option<String>,
    pub rewritten_query: String,
    pub target: QueryTarget,
    pub resume_context: String,
    pub jd_context: String,
    pub resume_chunks: Vec<RankedResult>,
    pub jd_chunks: Vec<RankedResult>,
}

/// Rewrite an ambiguous user message into a stand-alone retrieval query,
/// resolving references against the last few history turns. Falls back to
/// the raw message when the LLM is disabled or fails.
pub async fn rewrite_query(config: &Config, history: &[ChatMessage], user_input: &str) -> String {
    if !config.llm.is_enabled() {
        return user_input.to_string();
    }

    let recent = history
        .iter()
        .rev()
        .take(6)
        .rev()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Rewrite the user's message into a clear, stand-alone search query.\n\
         Use the conversation history to resolve pronouns or vague references.\n\n\
         Conversation History:\n{}\n\n\
         User message:\n{}\n\n\
         Return ONLY the rewritten query. No explanations. No formatting.",
        recent, user_input
    );

    match llm::complete(&config.llm, &prompt, 60, 0.2).await {
        Ok(rewritten) if !rewritten.is_empty() => rewritten,
        Ok(_) => user_input.to_string(),
        Err(e) => {
            warn!(error = %e, "chat query rewrite failed; using the raw message");
            user_input.to_string()
        }
    }
}

fn join_chunks(chunks: &[RankedResult]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Run one chat turn: rewrite, classify, retrieve, and (when an LLM is
/// configured) answer. Retrieval touches only the document(s) the intent
/// targets.
pub async fn chat_turn(
    config: &Config,
    session: &Session,
    reranker: &dyn Reranker,
    history: &[ChatMessage],
    user_msg: &str,
) -> ChatReply {
    let rewritten = rewrite_query(config, history, user_msg).await;
    let target = target_for_retrieval(user_msg);

    let opts = SearchOptions::from_config(&config.retrieval).with_top_k(CHAT_TOP_K);

    let resume_chunks = if matches!(target, QueryTarget::Resume | QueryTarget::Both) {
        hybrid_search(&rewritten, &session.resume, &config.embedding, reranker, &opts).await
    } else {
        Vec::new()
    };

    let jd_chunks = if matches!(target, QueryTarget::Jd | QueryTarget::Both) {
        hybrid_search(&rewritten, &session.jd, &config.embedding, reranker, &opts).await
    } else {
        Vec::new()
    };

    let resume_context = join_chunks(&resume_chunks);
    let jd_context = join_chunks(&jd_chunks);

    let answer = generate_answer(config, user_msg, &rewritten, &resume_context, &jd_context).await;

    ChatReply {
        answer,
        rewritten_query: rewritten,
        target,
        resume_context,
        jd_context,
        resume_chunks,
        jd_chunks,
    }
}

async fn generate_answer(
    config: &Config,
    user_msg: &str,
    rewritten: &str,
    resume_context: &str,
    jd_context: &str,
) -> Option<String> {
    if !config.llm.is_enabled() {
        return None;
    }

    let prompt = format!(
        "You are a career assistant AI.\n\n\
         Use ONLY the provided Resume Context and JD Context to answer the user's question.\n\
         Do NOT hallucinate details not present in context.\n\n\
         User Question:\n{}\n\n\
         Rewritten Query (for retrieval):\n{}\n\n\
         Resume Context:\n{}\n\n\
         JD Context:\n{}",
        user_msg, rewritten, resume_context, jd_context
    );

    match llm::complete(&config.llm, &prompt, 300, 0.4).await {
        Ok(answer) => Some(answer),
        Err(e) => {
            warn!(error = %e, "chat answer generation failed; returning context only");
            None
        }
    }
}

/// Append a turn to the history and trim it to [`HISTORY_LIMIT`].
pub fn push_history(history: &mut Vec<ChatMessage>, user_msg: &str, answer: Option<&str>) {
    history.push(ChatMessage::user(user_msg));
    if let Some(answer) = answer {
        history.push(ChatMessage::assistant(answer));
    }
    if history.len() > HISTORY_LIMIT {
        let excess = history.len() - HISTORY_LIMIT;
        history.drain(..excess);
    }
}
