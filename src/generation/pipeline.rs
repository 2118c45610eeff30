/*!
 * Pipeline assembly and the `generate` entry point.
 */

use log::{error, info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::context::{GenerationContext, Rendered, Seeded};
use super::speech_stage::SpeechStage;
use super::stage::{Stage, StageExt};
use super::text_stage::TextStage;
use super::video_stage::VideoStage;
use super::workspace::{ArtifactDir, NameGenerator, UuidNames, WorkspaceManager};
use crate::collaborators::{BackgroundPool, Captioner, MediaToolkit, SpeechSynthesizer, TextGenerator};
use crate::errors::GenerationError;

/// Shared handles to the external collaborators
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub media: Arc<dyn MediaToolkit>,
    pub captioner: Arc<dyn Captioner>,
}

/// Run-independent pipeline settings
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Narration prompt template with a `{prompt}` placeholder
    pub narration_template: String,
    /// Extension of synthesized audio files
    pub audio_extension: String,
    /// Pool of background videos
    pub background_dir: PathBuf,
    /// Durable directory for exported videos
    pub output_dir: PathBuf,
    /// Parent of run workspaces; system temp dir when None
    pub workspace_root: Option<PathBuf>,
    /// Naming strategy for every generated file
    pub names: Arc<dyn NameGenerator>,
}

impl GeneratorSettings {
    pub fn new(background_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            narration_template: super::text_stage::PROMPT_PLACEHOLDER.to_string(),
            audio_extension: "mp3".to_string(),
            background_dir: background_dir.into(),
            output_dir: output_dir.into(),
            workspace_root: None,
            names: Arc::new(UuidNames),
        }
    }
}

/// Builds the text -> speech -> video pipeline and drives runs through it
#[derive(Debug, Clone)]
pub struct Generator {
    collaborators: Collaborators,
    backgrounds: BackgroundPool,
    workspaces: WorkspaceManager,
    output: ArtifactDir,
    narration_template: String,
    audio_extension: String,
}

impl Generator {
    pub fn new(collaborators: Collaborators, settings: GeneratorSettings) -> Self {
        Self {
            collaborators,
            backgrounds: BackgroundPool::new(settings.background_dir),
            workspaces: WorkspaceManager::new(settings.workspace_root, Arc::clone(&settings.names)),
            output: ArtifactDir::new(settings.output_dir, settings.names),
            narration_template: settings.narration_template,
            audio_extension: settings.audio_extension,
        }
    }

    /// Link Text -> Speech -> Video into a single stage
    pub fn assemble(&self) -> impl Stage<Input = GenerationContext<Seeded>, Output = GenerationContext<Rendered>> {
        TextStage::new(Arc::clone(&self.collaborators.text), self.narration_template.clone())
            .then(SpeechStage::new(
                Arc::clone(&self.collaborators.speech),
                self.audio_extension.clone(),
            ))
            .then(VideoStage::new(
                self.backgrounds.clone(),
                Arc::clone(&self.collaborators.media),
                Arc::clone(&self.collaborators.captioner),
                self.output.clone(),
            ))
    }

    /// Produce a narrated video for `prompt` and return its path
    ///
    /// The run workspace is removed on every path. If the run failed and
    /// removal also fails, the run's error wins and the removal error is
    /// logged.
    pub async fn generate(&self, prompt: &str) -> Result<PathBuf, GenerationError> {
        let start = Instant::now();
        let workspace = self.workspaces.acquire()?;
        info!("Starting generation in {}", workspace.path().display());

        let outcome = self.run(prompt, workspace.artifacts()).await;
        let result = settle_run(outcome, workspace.release());
        match &result {
            Ok(path) => info!("Generation finished in {:.2?}: {}", start.elapsed(), path.display()),
            Err(e) => error!("Generation failed after {:.2?}: {}", start.elapsed(), e),
        }
        result
    }

    async fn run(&self, prompt: &str, workspace: ArtifactDir) -> Result<PathBuf, GenerationError> {
        let context = GenerationContext::seed(prompt, workspace)?;
        let rendered = self.assemble().execute(context).await?;
        Ok(rendered.into_final_video())
    }
}

/// Combine a run's outcome with the result of removing its workspace
///
/// A run that succeeded but could not be cleaned up is reported as failed, so
/// its exported video is removed too.
fn settle_run(outcome: Result<PathBuf, GenerationError>, cleanup: io::Result<()>) -> Result<PathBuf, GenerationError> {
    match (outcome, cleanup) {
        (Ok(path), Ok(())) => Ok(path),
        (Ok(path), Err(cleanup)) => {
            error!("Failed to remove workspace: {}", cleanup);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove exported video {}: {}", path.display(), e);
            }
            Err(GenerationError::resource("remove workspace", cleanup))
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            error!("Workspace removal also failed: {}", cleanup);
            Err(e)
        }
    }
}
