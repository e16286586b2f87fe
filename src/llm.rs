//! Chat-completion provider.
//!
//! One narrow entry point, [`complete`], dispatched on the configured
//! provider. Only the Groq OpenAI-compatible endpoint is wired up; the
//! `"disabled"` provider errors, and callers that can degrade (query
//! expansion) fall back to their input, while callers that cannot (the
//! gap-analysis narrative) simply omit the LLM output.
//!
//! Missing credentials for an enabled provider are a configuration error and
//! surface at startup via [`check_config`], never mid-request.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::warn;

use crate::config::LlmConfig;

const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Verify that an enabled provider is usable. Called at startup so that a
/// missing API key fails the process before any request is accepted.
pub fn check_config(config: &LlmConfig) -> Result<()> {
    match config.provider.as_str() {
        "disabled" => Ok(()),
        "groq" => {
            if std::env::var(API_KEY_ENV).is_err() {
                bail!("{} environment variable not set", API_KEY_ENV);
            }
            Ok(())
        }
        other => bail!("Unknown llm provider: {}", other),
    }
}

/// Run one prompt through the configured chat-completion model.
///
/// # Errors
///
/// - `"disabled"` provider: always errors.
/// - `"groq"` provider: missing API key, HTTP error, or a malformed
///   response body.
pub async fn complete(
    config: &LlmConfig,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String> {
    match config.provider.as_str() {
        "groq" => complete_groq(config, prompt, max_tokens, temperature).await,
        "disabled" => bail!("LLM provider is disabled"),
        other => bail!("Unknown llm provider: {}", other),
    }
}

async fn complete_groq(
    config: &LlmConfig,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String> {
    let api_key = std::env::var(API_KEY_ENV)
        .map_err(|_| anyhow::anyhow!("{} not set", API_KEY_ENV))?;

    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("llm.model required"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": max_tokens,
        "temperature": temperature,
    });

    let response = client
        .post(format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .context("completion request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("completion API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing message content"))
}

/// Rewrite a user query into a retrieval-optimized form.
///
/// Returns the original query unchanged when the LLM is disabled or the call
/// fails — expansion is an enhancement, never a dependency.
pub async fn expand_query(config: &LlmConfig, user_query: &str) -> String {
    if !config.is_enabled() {
        return user_query.to_string();
    }

    let prompt = format!(
        "Rewrite the following user query into a search-optimized query for semantic retrieval.\n\
         Make it explicit, skill-focused, and context-rich.\n\n\
         User query: \"{}\"\n\n\
         Return ONLY the rewritten query.",
        user_query
    );

    match complete(config, &prompt, 50, 0.1).await {
        Ok(expanded) if !expanded.is_empty() => expanded,
        Ok(_) => user_query.to_string(),
        Err(e) => {
            warn!(error = %e, "query expansion failed; using the raw query");
            user_query.to_string()
        }
    }
}
