use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_candidate_k")]
    pub bm25_k: usize,
    #[serde(default = "default_candidate_k")]
    pub vec_k: usize,
    #[serde(default = "default_use_rerank")]
    pub use_rerank: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            bm25_k: default_candidate_k(),
            vec_k: default_candidate_k(),
            use_rerank: default_use_rerank(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_candidate_k() -> usize {
    20
}
fn default_use_rerank() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RerankConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            base_url: default_llm_base_url(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_llm_max_tokens() -> u32 {
    700
}
fn default_bind() -> String {
    "127.0.0.1:7040".to_string()
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl RerankConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// A configuration with every provider disabled and default retrieval
    /// settings. Used by commands that can run without a config file and by
    /// tests.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Validate a configuration. Provider misconfiguration is fatal here, at
/// startup — retrieval-stage failures later on degrade instead.
pub fn validate(config: &Config) -> Result<()> {
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.bm25_k < 1 || config.retrieval.vec_k < 1 {
        anyhow::bail!("retrieval.bm25_k and retrieval.vec_k must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "hash" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or hash.",
            other
        ),
    }
    if config.embedding.provider == "openai" {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!("embedding.dims must be > 0 when provider is 'openai'");
        }
        if config.embedding.model.is_none() {
            anyhow::bail!("embedding.model must be specified when provider is 'openai'");
        }
    }
    if config.embedding.provider == "hash" && config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0 when provider is 'hash'");
    }

    match config.rerank.provider.as_str() {
        "disabled" | "tei" => {}
        other => anyhow::bail!(
            "Unknown rerank provider: '{}'. Must be disabled or tei.",
            other
        ),
    }
    if config.rerank.provider == "tei" && config.rerank.base_url.is_none() {
        anyhow::bail!("rerank.base_url must be specified when provider is 'tei'");
    }

    match config.llm.provider.as_str() {
        "disabled" | "groq" => {}
        other => anyhow::bail!("Unknown llm provider: '{}'. Must be disabled or groq.", other),
    }
    if config.llm.provider == "groq" && config.llm.model.is_none() {
        anyhow::bail!("llm.model must be specified when provider is 'groq'");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(content: &str) -> Result<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.bm25_k, 20);
        assert_eq!(config.retrieval.vec_k, 20);
        assert!(config.retrieval.use_rerank);
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.rerank.provider, "disabled");
    }

    #[test]
    fn test_openai_requires_model_and_dims() {
        let err = load_from_str("[embedding]\nprovider = \"openai\"\n").unwrap_err();
        assert!(err.to_string().contains("dims"));

        let err = load_from_str(
            "[embedding]\nprovider = \"openai\"\ndims = 1536\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_unknown_providers_rejected() {
        assert!(load_from_str("[embedding]\nprovider = \"bert\"\n").is_err());
        assert!(load_from_str("[rerank]\nprovider = \"local\"\n").is_err());
        assert!(load_from_str("[llm]\nprovider = \"openrouter\"\n").is_err());
    }

    #[test]
    fn test_tei_requires_base_url() {
        let err = load_from_str("[rerank]\nprovider = \"tei\"\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_hash_provider_needs_no_model() {
        let config = load_from_str("[embedding]\nprovider = \"hash\"\ndims = 256\n").unwrap();
        assert!(config.embedding.is_enabled());
        assert_eq!(config.embedding.dims, Some(256));
    }

    #[test]
    fn test_top_k_validation() {
        assert!(load_from_str("[retrieval]\ntop_k = 0\n").is_err());
    }
}
