use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::retry::with_backoff;
use crate::traits::{Generation, GenerationProvider};
use crate::STRICT_JSON_SYSTEM;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub struct OpenRouter {
    api_key: String,
    model: String,
    http: reqwest::Client,
    app_name: Option<String>,
    base_url: String,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            app_name: None,
            base_url: OPENROUTER_API_URL.to_string(),
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| ProviderError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref name) = self.app_name {
            if let Ok(val) = HeaderValue::from_str(name) {
                headers.insert("X-Title", val);
            }
        }
        Ok(headers)
    }

    async fn chat_once(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": STRICT_JSON_SYSTEM},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.1,
        });

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Response(e.to_string()))?;

        let model_name = data.model.unwrap_or_else(|| self.model.clone());
        let usage = data.usage.unwrap_or_else(|| serde_json::json!({}));
        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Response("no choices in OpenRouter response".to_string()))?;

        Ok(Generation {
            text,
            usage,
            model_name,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenRouter {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn generate(
        &self,
        prompt: &str,
        request_id: &str,
    ) -> Result<Generation, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Config(
                "OPENROUTER_API_KEY is not configured.".to_string(),
            ));
        }
        debug!(request_id, model = %self.model, "OpenRouter generation request");
        with_backoff("OpenRouter generate", || self.chat_once(prompt)).await
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
