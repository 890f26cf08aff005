use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Instruction template sent with every summarization request.
const SYSTEM_PROMPT: &str = "You are an efficient summarization assistant. \
Produce a concise, structured summary with: 1) Title (if derivable), \
2) TL;DR (1 sentence), 3) Key Points (bullet list), 4) Action Items if any. \
Keep factual, do not hallucinate.";

/// Input longer than this is truncated before it is sent.
const MAX_INPUT_CHARS: usize = 20_000;

/// Hosted-LLM summarization seam. The production implementation talks to the
/// Anthropic messages API; tests substitute a fake.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`, with the document's filename as context.
    async fn summarize(&self, text: &str, filename: &str) -> Result<String, AppError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Claude-backed summarizer.
pub struct ClaudeSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeSummarizer {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }

    /// Build the summarizer from configuration; `None` when no API key is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.anthropic_api_key.clone().map(|key| {
            Self::new(
                key,
                config.anthropic_model.clone(),
                config.summary_max_tokens,
            )
        })
    }

    fn build_user_prompt(text: &str, filename: &str) -> String {
        let mut truncated: String = text.chars().take(MAX_INPUT_CHARS).collect();
        if text.chars().count() > MAX_INPUT_CHARS {
            truncated.push_str("\n[TRUNCATED]");
        }
        format!(
            "Filename: {}\nPlease summarize the following document.\n\n\
             --- DOCUMENT START ---\n{}\n--- DOCUMENT END ---",
            filename, truncated
        )
    }
}

#[async_trait]
impl Summarizer for ClaudeSummarizer {
    async fn summarize(&self, text: &str, filename: &str) -> Result<String, AppError> {
        info!(
            "Calling {} for summarization (chars={})",
            self.model,
            text.len()
        );

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": 0.3,
                "system": SYSTEM_PROMPT,
                "messages": [{
                    "role": "user",
                    "content": Self::build_user_prompt(text, filename),
                }],
            }))
            .send()
            .await
            .map_err(|e| AppError::Summarization(format!("LLM request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Summarization(format!(
                "LLM provider returned {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Summarization(format!("Invalid LLM response: {}", e)))?;

        let summary = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if summary.is_empty() {
            return Err(AppError::Summarization(
                "LLM returned an empty summary".to_string(),
            ));
        }
        Ok(summary)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_not_truncated() {
        let prompt = ClaudeSummarizer::build_user_prompt("short text", "a.txt");
        assert!(prompt.contains("Filename: a.txt"));
        assert!(prompt.contains("short text"));
        assert!(!prompt.contains("[TRUNCATED]"));
    }

    #[test]
    fn long_input_gets_a_truncation_marker() {
        let long = "x".repeat(MAX_INPUT_CHARS + 1);
        let prompt = ClaudeSummarizer::build_user_prompt(&long, "a.txt");
        assert!(prompt.contains("[TRUNCATED]"));
        assert!(!prompt.contains(&long));
    }
}
