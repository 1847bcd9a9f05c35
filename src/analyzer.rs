//! Semantic analysis capability: compares a document against a target
//! description using an external reasoning service.
//!
//! The engine only depends on the [`SemanticAnalyzer`] trait; the
//! bundled [`ChatAnalyzer`] talks to an OpenAI-compatible chat
//! completions API in JSON mode. Any transport failure or malformed
//! response surfaces as [`Error::AnalysisUnavailable`] — the match
//! operation aborts rather than defaulting the score.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::models::SemanticAnalysis;

/// External capability producing a semantic match score plus gap
/// analysis for a (document, target) pair.
#[async_trait]
pub trait SemanticAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        document: &str,
        target: &str,
        skills: &[String],
    ) -> Result<SemanticAnalysis>;
}

/// Analyzer backed by a JSON-mode chat completions endpoint.
///
/// Requires the `ANALYZER_API_KEY` environment variable. Document and
/// target texts are truncated to `excerpt_chars` before being sent.
pub struct ChatAnalyzer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    excerpt_chars: usize,
}

const SYSTEM_PROMPT: &str = "You are an expert document-to-requirements matcher. \
Output strictly valid JSON with no markdown and this exact structure:\n\
{\"match_score\": 0-100, \"skill_gaps\": [\"...\"], \"improvement_suggestions\": [\"...\"]}";

impl ChatAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let api_key = std::env::var("ANALYZER_API_KEY")
            .map_err(|_| Error::Config("ANALYZER_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::AnalysisUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            excerpt_chars: config.excerpt_chars,
        })
    }

    fn build_user_prompt(&self, document: &str, target: &str, skills: &[String]) -> String {
        format!(
            "Document (excerpt):\n{}\n\nExtracted skills: {}\n\nTarget description:\n{}\n\n\
             Analyze how well the document matches the target. Respond with the JSON structure \
             from the system message.",
            truncate_chars(document, self.excerpt_chars),
            skills.join(", "),
            truncate_chars(target, self.excerpt_chars),
        )
    }
}

#[async_trait]
impl SemanticAnalyzer for ChatAnalyzer {
    async fn analyze(
        &self,
        document: &str,
        target: &str,
        skills: &[String],
    ) -> Result<SemanticAnalysis> {
        let body = serde_json::json!({
            "model": self.model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": self.build_user_prompt(document, target, skills)},
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::AnalysisUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::AnalysisUnavailable(format!(
                "analyzer API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::AnalysisUnavailable(e.to_string()))?;

        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.pointer("/message/content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                Error::AnalysisUnavailable("analyzer response missing message content".into())
            })?;

        parse_analysis(content)
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse the analyzer's JSON payload into a [`SemanticAnalysis`].
///
/// The score is clamped to `[0, 100]`; missing list fields default to
/// empty. A payload without `match_score` is malformed.
fn parse_analysis(content: &str) -> Result<SemanticAnalysis> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::AnalysisUnavailable(format!("analyzer returned invalid JSON: {e}")))?;

    let match_score = value
        .get("match_score")
        .and_then(|s| s.as_f64())
        .ok_or_else(|| Error::AnalysisUnavailable("analyzer omitted match_score".into()))?
        .clamp(0.0, 100.0);

    let string_list = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };

    Ok(SemanticAnalysis {
        match_score,
        skill_gaps: string_list("skill_gaps"),
        improvement_suggestions: string_list("improvement_suggestions"),
    })
}
