use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::SpeechSynthesizer;
use crate::errors::{CollaboratorError, ProviderError};
use crate::file_utils::FileManager;
use crate::process::{args, CommandRunner};

/// Fail unless the synthesizer left a non-empty file at `dest`
fn verify_audio(dest: &Path) -> Result<(), CollaboratorError> {
    if !FileManager::file_exists(dest) {
        return Err(CollaboratorError::MissingOutput(dest.to_path_buf()));
    }
    if !FileManager::is_non_empty_file(dest) {
        return Err(CollaboratorError::EmptyOutput("audio file"));
    }
    Ok(())
}

/// Local TTS script: `<python> <script> <text> <dest>`
#[derive(Debug, Clone)]
pub struct ScriptSpeechSynthesizer {
    runner: Arc<dyn CommandRunner>,
    python: String,
    script: String,
    timeout: Duration,
}

impl ScriptSpeechSynthesizer {
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
impl SpeechSynthesizer for ScriptSpeechSynthesizer {
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<(), CollaboratorError> {
        let dest_arg = dest.to_string_lossy().to_string();
        self.runner
            .run(
                &self.python,
                &args([self.script.as_str(), text, dest_arg.as_str()]),
                self.timeout,
            )
            .await?;
        verify_audio(dest)
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

/// Remote speech API: POST `{"text": ...}`, the response body is the audio
#[derive(Debug, Clone)]
pub struct HttpSpeechSynthesizer {
    endpoint: String,
    client: Client,
}

impl HttpSpeechSynthesizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<(), CollaboratorError> {
        debug!("Requesting speech from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SpeechRequest { text })
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach speech API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Speech API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            }
            .into());
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read speech audio: {}", e)))?;
        if audio.is_empty() {
            return Err(CollaboratorError::EmptyOutput("audio file"));
        }

        FileManager::write_bytes(dest, &audio)?;
        verify_audio(dest)
    }
}
