//! Test doubles for pipeline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use ai_client::{Generation, GenerationProvider, ProviderError};
use esgscope_common::Stage;

use crate::orchestrator::StageObserver;

/// Generation provider that replays a scripted sequence of responses and
/// records every prompt it was sent.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub prompts: Mutex<Vec<String>>,
    model_name: String,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            model_name: "scripted-model".to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        _request_id: &str,
    ) -> Result<Generation, ProviderError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Response("script exhausted".to_string())));
        next.map(|text| Generation {
            text,
            usage: serde_json::json!({"total_tokens": 0}),
            model_name: self.model_name.clone(),
        })
    }
}

/// Observer that records the stages it saw, in order.
#[derive(Default)]
pub struct RecordingObserver {
    pub stages: Vec<Stage>,
}

#[async_trait]
impl StageObserver for RecordingObserver {
    async fn on_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }
}
