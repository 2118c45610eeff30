use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::app_config::{CaptionMode, Config, SpeechProvider, TextProvider};
use crate::collaborators::{
    BackgroundFetcher, Captioner, FfmpegToolkit, HttpSpeechSynthesizer, MediaToolkit, OllamaTextGenerator,
    ScriptCaptioner, ScriptSpeechSynthesizer, ScriptTextGenerator, SpeechSynthesizer, SubtitleBurner, TextGenerator,
};
use crate::generation::{ArtifactDir, Collaborators, Generator, GeneratorSettings, UuidNames};
use crate::process::{CommandRunner, TokioCommandRunner};
use crate::providers::ollama::Ollama;
use crate::server::{self, ApiState};

// @module: Application controller wiring configuration to the pipeline

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collaborators described by the configuration, all sharing `runner`
    pub fn build_collaborators(&self, runner: Arc<dyn CommandRunner>) -> Collaborators {
        let config = &self.config;

        let text: Arc<dyn TextGenerator> = match config.text.provider {
            TextProvider::Ollama => {
                let client = Ollama::new_with_config(
                    &config.text.endpoint,
                    Duration::from_secs(config.text.timeout_secs),
                    config.text.max_retries,
                    config.text.retry_backoff_ms,
                );
                Arc::new(
                    OllamaTextGenerator::new(client, &config.text.model)
                        .with_system(config.text.system_prompt.clone())
                        .with_sampling(config.text.temperature, config.text.max_tokens),
                )
            }
            TextProvider::Script => Arc::new(ScriptTextGenerator::new(
                Arc::clone(&runner),
                &config.python_path,
                &config.text.script_path,
                Duration::from_secs(config.text.timeout_secs),
            )),
        };

        let speech_timeout = Duration::from_secs(config.speech.timeout_secs);
        let speech: Arc<dyn SpeechSynthesizer> = match config.speech.provider {
            SpeechProvider::Script => Arc::new(ScriptSpeechSynthesizer::new(
                Arc::clone(&runner),
                &config.python_path,
                &config.speech.script_path,
                speech_timeout,
            )),
            SpeechProvider::Http => Arc::new(HttpSpeechSynthesizer::new(&config.speech.endpoint, speech_timeout)),
        };

        let command_timeout = Duration::from_secs(config.video.command_timeout_secs);
        let media: Arc<dyn MediaToolkit> = Arc::new(FfmpegToolkit::new(
            Arc::clone(&runner),
            &config.video.ffmpeg_path,
            &config.video.ffprobe_path,
            command_timeout,
            &config.captions.force_style,
        ));

        let captioner: Arc<dyn Captioner> = match config.captions.mode {
            CaptionMode::Subtitles => Arc::new(SubtitleBurner::new(
                Arc::clone(&media),
                config.captions.max_words_per_caption,
            )),
            CaptionMode::Script => Arc::new(ScriptCaptioner::new(
                runner,
                &config.python_path,
                &config.captions.script_path,
                command_timeout,
            )),
        };

        Collaborators {
            text,
            speech,
            media,
            captioner,
        }
    }

    /// Run-independent settings taken from the configuration
    pub fn generator_settings(&self) -> GeneratorSettings {
        let mut settings = GeneratorSettings::new(&self.config.video.background_dir, &self.config.video.output_dir);
        settings.narration_template = self.config.text.narration_template.clone();
        settings.audio_extension = self.config.speech.audio_extension.clone();
        settings.workspace_root = self.config.video.workspace_root.clone();
        settings
    }

    /// Generator backed by real processes and HTTP clients
    pub fn build_generator(&self) -> Generator {
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
        Generator::new(self.build_collaborators(runner), self.generator_settings())
    }

    /// Generate one video from the command line, with a spinner
    pub async fn run_generate(&self, prompt: &str) -> Result<PathBuf> {
        let generator = self.build_generator();

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!("Generating video for \"{}\"", prompt));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = generator.generate(prompt).await;
        spinner.finish_and_clear();

        let video = result.context("Video generation failed")?;
        info!("Video written to {}", video.display());
        Ok(video)
    }

    /// Serve the HTTP API until `shutdown` resolves
    pub async fn run_server<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;
        info!("Listening on {}", address);

        let state = ApiState::new(Arc::new(self.build_generator()));
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        server::serve(listener, state, shutdown, grace)
            .await
            .context("HTTP server error")?;

        info!("Server stopped");
        Ok(())
    }

    /// Download background videos for `topic` into the background directory
    pub async fn fetch_backgrounds(&self, topic: &str) -> Result<Vec<PathBuf>> {
        let settings = &self.config.backgrounds;
        if settings.api_key.trim().is_empty() {
            warn!("No Pixabay API key configured; set PIXABAY_API_KEY or backgrounds.api_key");
        }

        let fetcher = BackgroundFetcher::new(
            &settings.endpoint,
            &settings.api_key,
            settings.per_page,
            Duration::from_secs(self.config.video.command_timeout_secs),
        );
        let dest = ArtifactDir::new(&self.config.video.background_dir, Arc::new(UuidNames));

        fetcher
            .fetch(topic, &dest)
            .await
            .with_context(|| format!("Failed to fetch background videos for '{}'", topic))
    }
}
