use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::retry::with_backoff;
use crate::traits::{Generation, GenerationProvider};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub struct Gemini {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn generate_once(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key,
        );
        let payload = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": 0.1},
        });

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Response(e.to_string()))?;

        let usage = data.usage_metadata.unwrap_or_else(|| serde_json::json!({}));
        let text = data
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| ProviderError::Response("no candidates in Gemini response".to_string()))?;

        Ok(Generation {
            text,
            usage,
            model_name: self.model.clone(),
        })
    }
}

#[async_trait]
impl GenerationProvider for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        request_id: &str,
    ) -> Result<Generation, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Config(
                "GEMINI_API_KEY is not configured.".to_string(),
            ));
        }
        debug!(request_id, model = %self.model, "Gemini generation request");
        with_backoff("Gemini generate", || self.generate_once(prompt)).await
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_config_error() {
        let provider = Gemini::new("", "gemini-1.5-flash");
        let err = provider.generate("prompt", "req-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn parses_multi_part_candidates() {
        let raw = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}],
            "usageMetadata": {"totalTokenCount": 12}
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }
}
