use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::retry::with_backoff;
use crate::traits::{Generation, GenerationProvider};
use crate::STRICT_JSON_SYSTEM;

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub struct AzureOpenAi {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    http: reqwest::Client,
}

impl AzureOpenAi {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ProviderError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat_once(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version,
        );
        let payload = serde_json::json!({
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

        let model_name = data.model.unwrap_or_else(|| self.deployment.clone());
        let usage = data.usage.unwrap_or_else(|| serde_json::json!({}));
        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::Response("no choices in Azure OpenAI response".to_string())
            })?;

        Ok(Generation {
            text,
            usage,
            model_name,
        })
    }
}

#[async_trait]
impl GenerationProvider for AzureOpenAi {
    fn name(&self) -> &'static str {
        "azure_openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        request_id: &str,
    ) -> Result<Generation, ProviderError> {
        if self.endpoint.is_empty() || self.api_key.is_empty() {
            return Err(ProviderError::Config(
                "Azure OpenAI is not configured.".to_string(),
            ));
        }
        if self.deployment.is_empty() {
            return Err(ProviderError::Config(
                "AZURE_OPENAI_DEPLOYMENT is not configured.".to_string(),
            ));
        }
        debug!(request_id, deployment = %self.deployment, "Azure OpenAI generation request");
        with_backoff("Azure OpenAI generate", || self.chat_once(prompt)).await
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
