use async_trait::async_trait;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;

use super::context::{GenerationContext, Narrated, Seeded};
use super::stage::Stage;
use crate::collaborators::TextGenerator;
use crate::errors::{CollaboratorError, GenerationError, StageKind};

static BLANK_LINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line pattern"));

/// Placeholder replaced by the user prompt in a narration template
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Collapse blank-line runs into single line breaks and trim the result
pub fn normalize_narration(raw: &str) -> String {
    BLANK_LINE_RUNS.replace_all(raw.trim(), "\n").to_string()
}

/// Produces the narration text
#[derive(Debug, Clone)]
pub struct TextStage {
    generator: Arc<dyn TextGenerator>,
    template: String,
}

impl TextStage {
    pub fn new(generator: Arc<dyn TextGenerator>, template: impl Into<String>) -> Self {
        Self {
            generator,
            template: template.into(),
        }
    }

    /// Request sent to the generator for `prompt`
    pub fn shape_request(&self, prompt: &str) -> String {
        if self.template.contains(PROMPT_PLACEHOLDER) {
            self.template.replace(PROMPT_PLACEHOLDER, prompt)
        } else {
            format!("{}\n\n{}", self.template, prompt)
        }
    }
}

#[async_trait]
impl Stage for TextStage {
    type Input = GenerationContext<Seeded>;
    type Output = GenerationContext<Narrated>;

    fn kind(&self) -> StageKind {
        StageKind::Text
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, GenerationError> {
        let start = Instant::now();
        info!("Generating narration for prompt: {}", input.prompt());

        let request = self.shape_request(input.prompt());
        let raw = self.generator.generate(&request).await.map_err(|e| {
            error!("Narration generation failed: {}", e);
            GenerationError::collaborator(StageKind::Text, e)
        })?;

        let text = normalize_narration(&raw);
        if text.is_empty() {
            error!("Narration generator returned no text");
            return Err(GenerationError::collaborator(
                StageKind::Text,
                CollaboratorError::EmptyOutput("narration"),
            ));
        }

        info!("Narration ready ({} chars) in {:.2?}", text.chars().count(), start.elapsed());
        Ok(input.with_text(text))
    }
}
