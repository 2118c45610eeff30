use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

use super::context::{GenerationContext, Narrated, Voiced};
use super::stage::Stage;
use crate::collaborators::SpeechSynthesizer;
use crate::errors::{CollaboratorError, GenerationError, StageKind};
use crate::file_utils::FileManager;

/// Synthesizes the narration into an audio file inside the workspace
#[derive(Debug, Clone)]
pub struct SpeechStage {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    audio_extension: String,
}

impl SpeechStage {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, audio_extension: impl Into<String>) -> Self {
        Self {
            synthesizer,
            audio_extension: audio_extension.into(),
        }
    }
}

#[async_trait]
impl Stage for SpeechStage {
    type Input = GenerationContext<Narrated>;
    type Output = GenerationContext<Voiced>;

    fn kind(&self) -> StageKind {
        StageKind::Speech
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, GenerationError> {
        let start = Instant::now();
        let dest = input.workspace().artifact_path(&self.audio_extension);
        info!("Synthesizing speech into {}", dest.display());

        self.synthesizer
            .synthesize(input.generated_text(), &dest)
            .await
            .map_err(|e| {
                error!("Speech synthesis failed: {}", e);
                GenerationError::collaborator(StageKind::Speech, e)
            })?;

        if !FileManager::is_non_empty_file(&dest) {
            error!("Speech synthesis left no audio at {}", dest.display());
            return Err(GenerationError::collaborator(
                StageKind::Speech,
                CollaboratorError::MissingOutput(dest),
            ));
        }

        info!("Speech ready in {:.2?}", start.elapsed());
        input.with_speech(dest)
    }
}
