/*!
 * Run-scoped generation context.
 *
 * The context moves through `Seeded -> Narrated -> Voiced -> Rendered`. Each
 * transition consumes the previous value and introduces exactly one field, so
 * every field is written once and a stage can only read what earlier stages
 * produced.
 */

use std::path::{Path, PathBuf};

use super::workspace::ArtifactDir;
use crate::errors::GenerationError;

/// Fresh context holding only the prompt
#[derive(Debug)]
pub struct Seeded;

/// Narration text is available
#[derive(Debug)]
pub struct Narrated {
    text: String,
}

/// Speech audio is available
#[derive(Debug)]
pub struct Voiced {
    text: String,
    speech_file: PathBuf,
}

/// Final video has been exported
#[derive(Debug)]
pub struct Rendered {
    text: String,
    speech_file: PathBuf,
    final_video: PathBuf,
}

/// Record threaded through the stages of one run
#[derive(Debug)]
pub struct GenerationContext<S> {
    workspace: ArtifactDir,
    prompt: String,
    state: S,
}

impl<S> GenerationContext<S> {
    /// Run workspace
    pub fn workspace(&self) -> &ArtifactDir {
        &self.workspace
    }

    /// Original prompt
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

impl GenerationContext<Seeded> {
    /// Start a run; a blank prompt is rejected
    pub fn seed(prompt: impl Into<String>, workspace: ArtifactDir) -> Result<Self, GenerationError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidInput("prompt must not be empty".to_string()));
        }

        Ok(Self {
            workspace,
            prompt,
            state: Seeded,
        })
    }

    pub fn with_text(self, text: impl Into<String>) -> GenerationContext<Narrated> {
        GenerationContext {
            workspace: self.workspace,
            prompt: self.prompt,
            state: Narrated { text: text.into() },
        }
    }
}

impl GenerationContext<Narrated> {
    pub fn generated_text(&self) -> &str {
        &self.state.text
    }

    /// Attach the speech file, which must live inside the run workspace
    pub fn with_speech(self, speech_file: PathBuf) -> Result<GenerationContext<Voiced>, GenerationError> {
        if !self.workspace.contains(&speech_file) {
            return Err(GenerationError::InvalidInput(format!(
                "speech file {} is outside the run workspace",
                speech_file.display()
            )));
        }

        Ok(GenerationContext {
            workspace: self.workspace,
            prompt: self.prompt,
            state: Voiced {
                text: self.state.text,
                speech_file,
            },
        })
    }
}

impl GenerationContext<Voiced> {
    pub fn generated_text(&self) -> &str {
        &self.state.text
    }

    pub fn speech_file(&self) -> &Path {
        &self.state.speech_file
    }

    pub fn with_video(self, final_video: PathBuf) -> GenerationContext<Rendered> {
        GenerationContext {
            workspace: self.workspace,
            prompt: self.prompt,
            state: Rendered {
                text: self.state.text,
                speech_file: self.state.speech_file,
                final_video,
            },
        }
    }
}

impl GenerationContext<Rendered> {
    pub fn generated_text(&self) -> &str {
        &self.state.text
    }

    pub fn speech_file(&self) -> &Path {
        &self.state.speech_file
    }

    pub fn final_video_path(&self) -> &Path {
        &self.state.final_video
    }

    /// Consume the context, keeping only the exported video path
    pub fn into_final_video(self) -> PathBuf {
        self.state.final_video
    }
}
