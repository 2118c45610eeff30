/*!
 * External collaborators of the generation pipeline.
 *
 * Each stage talks to the outside world only through the traits below:
 * - `TextGenerator`: prompt to narration text
 * - `SpeechSynthesizer`: text to an audio file
 * - `MediaToolkit`: path-in/path-out video operations
 * - `Captioner`: burns captions into a video
 *
 * Concrete adapters live in the submodules; `mock` holds scripted fakes.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use crate::errors::CollaboratorError;
use crate::generation::workspace::ArtifactDir;

pub mod backgrounds;
pub mod captions;
pub mod media;
pub mod mock;
pub mod speech;
pub mod text;

pub use backgrounds::{BackgroundFetcher, BackgroundPool};
pub use captions::{ScriptCaptioner, SubtitleBurner};
pub use media::FfmpegToolkit;
pub use speech::{HttpSpeechSynthesizer, ScriptSpeechSynthesizer};
pub use text::{OllamaTextGenerator, ScriptTextGenerator};

/// Produces narration text for a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Turns text into an audio file at `dest`
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<(), CollaboratorError>;
}

/// Video operations; every method reads its inputs and writes `out`
#[async_trait]
pub trait MediaToolkit: Send + Sync + Debug {
    /// Replace the video's audio track with `audio`
    async fn replace_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<(), CollaboratorError>;

    /// Duration of a media file
    async fn probe_duration(&self, media: &Path) -> Result<Duration, CollaboratorError>;

    /// Cut `input` to the first `duration`
    async fn trim(&self, input: &Path, duration: Duration, out: &Path) -> Result<(), CollaboratorError>;

    /// Burn an SRT subtitle track into the picture
    async fn burn_subtitles(&self, input: &Path, subtitles: &Path, out: &Path) -> Result<(), CollaboratorError>;

    /// Write the final, streamable container
    async fn export(&self, input: &Path, out: &Path) -> Result<(), CollaboratorError>;
}

/// Everything a captioner may need for one video
#[derive(Debug, Clone, Copy)]
pub struct CaptionJob<'a> {
    /// Video to caption
    pub video: &'a Path,
    /// Narration spoken in the video
    pub narration: &'a str,
    /// Spoken duration
    pub duration: Duration,
    /// Run workspace for side files
    pub workspace: &'a ArtifactDir,
    /// Captioned output
    pub out: &'a Path,
}

/// Adds captions derived from the speech to a video
#[async_trait]
pub trait Captioner: Send + Sync + Debug {
    async fn caption(&self, job: CaptionJob<'_>) -> Result<(), CollaboratorError>;
}
