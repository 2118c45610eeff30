use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use super::TextGenerator;
use crate::errors::CollaboratorError;
use crate::process::{args, CommandRunner};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::Provider;

/// Narration text from an Ollama model
#[derive(Debug, Clone)]
pub struct OllamaTextGenerator {
    client: Ollama,
    model: String,
    // @field: System prompt sent with every request
    system: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OllamaTextGenerator {
    pub fn new(client: Ollama, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Request sent for `prompt`
    pub fn request_for(&self, prompt: &str) -> GenerationRequest {
        let mut request = GenerationRequest::new(&self.model, prompt);
        if let Some(system) = &self.system {
            request = request.system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }
        request
    }
}

#[async_trait]
impl TextGenerator for OllamaTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        debug!("Requesting narration from Ollama model {}", self.model);
        let request = self.request_for(prompt);
        let response = self.client.complete(request).await?;
        Ok(Ollama::extract_text(&response))
    }
}

/// Narration text printed by a local script: `<python> <script> <prompt>`
#[derive(Debug, Clone)]
pub struct ScriptTextGenerator {
    runner: Arc<dyn CommandRunner>,
    python: String,
    script: String,
    timeout: Duration,
}

impl ScriptTextGenerator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        python: impl Into<String>,
        script: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            python: python.into(),
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let output = self
            .runner
            .run(&self.python, &args([self.script.as_str(), prompt]), self.timeout)
            .await?;
        Ok(output.stdout.replace("\n\n", "\n"))
    }
}
