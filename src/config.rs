//! TOML configuration parsing and validation.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

/// Score fusion and retrieval tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Weight for semantic vs lexical: `fused = (1-w)*lexical + w*semantic`.
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    /// Raw candidates fetched per requested result, to survive the
    /// ownership post-filter.
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            overfetch_factor: default_overfetch_factor(),
        }
    }
}

fn default_semantic_weight() -> f64 {
    crate::scoring::DEFAULT_SEMANTIC_WEIGHT
}
fn default_overfetch_factor() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"disabled"` or `"openai"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            api_url: default_api_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_model")]
    pub model: String,
    #[serde(default = "default_analyzer_api_url")]
    pub api_url: String,
    /// Document and target texts are truncated to this many characters
    /// before being sent to the analyzer.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: default_analyzer_model(),
            api_url: default_analyzer_api_url(),
            excerpt_chars: default_excerpt_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_analyzer_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_analyzer_api_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_excerpt_chars() -> usize {
    2000
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;

    if !(0.0..=1.0).contains(&config.matching.semantic_weight) {
        return Err(Error::Config(
            "matching.semantic_weight must be in [0.0, 1.0]".to_string(),
        ));
    }

    if config.matching.overfetch_factor < 1 {
        return Err(Error::Config(
            "matching.overfetch_factor must be >= 1".to_string(),
        ));
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            return Err(Error::Config(format!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            )));
        }
        if config.embedding.model.is_none() {
            return Err(Error::Config(format!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            )));
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => {
            return Err(Error::Config(format!(
                "unknown embedding provider: '{other}'. Must be disabled or openai."
            )))
        }
    }

    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty() {
        let config = parse_config("").unwrap();
        assert!((config.matching.semantic_weight - 0.7).abs() < 1e-9);
        assert_eq!(config.matching.overfetch_factor, 3);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.analyzer.excerpt_chars, 2000);
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let err = parse_config("[matching]\nsemantic_weight = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("semantic_weight"));
    }

    #[test]
    fn test_overfetch_zero_rejected() {
        let err = parse_config("[matching]\noverfetch_factor = 0\n").unwrap_err();
        assert!(err.to_string().contains("overfetch_factor"));
    }

    #[test]
    fn test_enabled_requires_dims_and_model() {
        let err = parse_config("[embedding]\nprovider = \"openai\"\n").unwrap_err();
        assert!(err.to_string().contains("dims"));

        let err = parse_config("[embedding]\nprovider = \"openai\"\ndims = 1536\n").unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse_config("[embedding]\nprovider = \"cohere\"\ndims = 4\nmodel = \"x\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("unknown embedding provider"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docmatch.toml");
        std::fs::write(
            &path,
            "[matching]\nsemantic_weight = 0.5\n\n[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!((config.matching.semantic_weight - 0.5).abs() < 1e-9);
        assert!(config.embedding.is_enabled());
        assert_eq!(config.embedding.dims, Some(1536));
    }
}
