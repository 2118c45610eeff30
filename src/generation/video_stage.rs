use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::context::{GenerationContext, Rendered, Voiced};
use super::stage::Stage;
use super::workspace::ArtifactDir;
use crate::collaborators::{BackgroundPool, CaptionJob, Captioner, MediaToolkit};
use crate::errors::{CollaboratorError, GenerationError, StageKind};
use crate::file_utils::FileManager;

fn video_failure(step: &str, e: CollaboratorError) -> GenerationError {
    error!("Video composition failed while trying to {}: {}", step, e);
    GenerationError::collaborator(StageKind::Video, e)
}

/// Composes background, speech and captions into the exported video
#[derive(Debug, Clone)]
pub struct VideoStage {
    backgrounds: BackgroundPool,
    media: Arc<dyn MediaToolkit>,
    captioner: Arc<dyn Captioner>,
    // @field: Durable destination for finished videos
    output: ArtifactDir,
}

impl VideoStage {
    pub fn new(
        backgrounds: BackgroundPool,
        media: Arc<dyn MediaToolkit>,
        captioner: Arc<dyn Captioner>,
        output: ArtifactDir,
    ) -> Self {
        Self {
            backgrounds,
            media,
            captioner,
            output,
        }
    }
}

#[async_trait]
impl Stage for VideoStage {
    type Input = GenerationContext<Voiced>;
    type Output = GenerationContext<Rendered>;

    fn kind(&self) -> StageKind {
        StageKind::Video
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, GenerationError> {
        let start = Instant::now();
        let workspace = input.workspace().clone();

        let background = self
            .backgrounds
            .select_async()
            .await
            .map_err(|e| video_failure("select a background", e))?;
        info!("Composing video over background {}", background.display());

        let combined = workspace.artifact_path("mp4");
        self.media
            .replace_audio(&background, input.speech_file(), &combined)
            .await
            .map_err(|e| video_failure("replace the audio track", e))?;

        // Crop to the narration, not the background
        let duration = self
            .media
            .probe_duration(input.speech_file())
            .await
            .map_err(|e| video_failure("measure the speech", e))?;

        let trimmed = workspace.artifact_path("mp4");
        self.media
            .trim(&combined, duration, &trimmed)
            .await
            .map_err(|e| video_failure("trim the video", e))?;

        let captioned = workspace.artifact_path("mp4");
        self.captioner
            .caption(CaptionJob {
                video: &trimmed,
                narration: input.generated_text(),
                duration,
                workspace: &workspace,
                out: &captioned,
            })
            .await
            .map_err(|e| video_failure("add captions", e))?;

        FileManager::ensure_dir(self.output.path())
            .map_err(|e| GenerationError::resource("create output directory", e))?;
        let final_video = self.output.artifact_path("mp4");
        if let Err(e) = self.media.export(&captioned, &final_video).await {
            // The output dir is not run-scoped, so a partial export must go now
            if final_video.exists() {
                warn!("Removing partial export {}", final_video.display());
                let _ = std::fs::remove_file(&final_video);
            }
            return Err(video_failure("export the video", e));
        }

        info!(
            "Video exported to {} ({:.1}s of speech) in {:.2?}",
            final_video.display(),
            duration.as_secs_f64(),
            start.elapsed()
        );
        Ok(input.with_video(final_video))
    }
}
