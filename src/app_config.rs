use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating, environment overrides and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Narration text generation
    #[serde(default)]
    pub text: TextConfig,

    /// Speech synthesis
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Video composition
    #[serde(default)]
    pub video: VideoConfig,

    /// Caption rendering
    #[serde(default)]
    pub captions: CaptionConfig,

    /// Background video downloads
    #[serde(default)]
    pub backgrounds: BackgroundFetchConfig,

    /// Python interpreter used for script collaborators
    #[serde(default = "default_python_path")]
    pub python_path: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            text: TextConfig::default(),
            speech: SpeechConfig::default(),
            video: VideoConfig::default(),
            captions: CaptionConfig::default(),
            backgrounds: BackgroundFetchConfig::default(),
            python_path: default_python_path(),
            log_level: LogLevel::default(),
        }
    }
}

/// Text generation backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextProvider {
    // @provider: Ollama HTTP endpoint
    #[default]
    Ollama,
    // @provider: Local script printing the narration on stdout
    Script,
}

impl TextProvider {
    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Script => "script".to_string(),
        }
    }
}

impl std::fmt::Display for TextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TextProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "script" => Ok(Self::Script),
            _ => Err(anyhow!("Invalid text provider: {}", s)),
        }
    }
}

/// Speech synthesis backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    // @provider: Local TTS script writing the audio file
    #[default]
    Script,
    // @provider: Remote API returning audio bytes
    Http,
}

impl std::str::FromStr for SpeechProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "script" => Ok(Self::Script),
            "http" => Ok(Self::Http),
            _ => Err(anyhow!("Invalid speech provider: {}", s)),
        }
    }
}

/// How captions are burned into the video
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    // @mode: SRT built from the narration, burned with ffmpeg
    #[default]
    Subtitles,
    // @mode: External captioning script (transcribes the audio itself)
    Script,
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds granted to in-flight requests on shutdown
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Narration text generation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextConfig {
    /// Backend to use
    #[serde(default)]
    pub provider: TextProvider,

    /// Ollama service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name (e.g., "llama3", "orca-mini")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Prompt template sent to the model
    /// Placeholders: {prompt}
    #[serde(default = "default_narration_template")]
    pub narration_template: String,

    /// Request timeout in seconds
    #[serde(default = "default_text_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub max_retries: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Script used when provider is "script"
    #[serde(default = "default_text_script")]
    pub script_path: String,

    /// Optional system prompt for the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Sampling temperature (model default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Cap on generated tokens (model default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            provider: TextProvider::default(),
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            narration_template: default_narration_template(),
            timeout_secs: default_text_timeout_secs(),
            max_retries: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            script_path: default_text_script(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Backend to use
    #[serde(default)]
    pub provider: SpeechProvider,

    /// Speech API URL when provider is "http"
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// TTS script when provider is "script"
    #[serde(default = "default_speech_script")]
    pub script_path: String,

    /// Extension of the produced audio file
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Timeout in seconds for one synthesis
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::default(),
            endpoint: String::new(),
            script_path: default_speech_script(),
            audio_extension: default_audio_extension(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

/// Video composition configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    /// Pool of background videos
    #[serde(default = "default_background_dir")]
    pub background_dir: PathBuf,

    /// Durable directory for exported videos
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Parent directory for run workspaces (system temp dir when absent)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout in seconds for a single media command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            background_dir: default_background_dir(),
            output_dir: default_output_dir(),
            workspace_root: None,
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

/// Caption configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionConfig {
    /// Caption backend
    #[serde(default)]
    pub mode: CaptionMode,

    /// Words shown at once on screen
    #[serde(default = "default_max_words_per_caption")]
    pub max_words_per_caption: usize,

    /// ASS style override passed to the subtitles filter
    #[serde(default = "default_force_style")]
    pub force_style: String,

    /// Captioning script when mode is "script"
    #[serde(default = "default_caption_script")]
    pub script_path: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            mode: CaptionMode::default(),
            max_words_per_caption: default_max_words_per_caption(),
            force_style: default_force_style(),
            script_path: default_caption_script(),
        }
    }
}

/// Pixabay background download configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackgroundFetchConfig {
    /// Pixabay API base URL
    #[serde(default = "default_pixabay_endpoint")]
    pub endpoint: String,

    /// Pixabay API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Number of videos requested per topic
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for BackgroundFetchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_pixabay_endpoint(),
            api_key: String::new(),
            per_page: default_per_page(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1323
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "orca-mini".to_string()
}

fn default_narration_template() -> String {
    "Write a short narration of about 60 words for a vertical video about: {prompt}. Reply with the narration only.".to_string()
}

fn default_text_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_text_script() -> String {
    "./pkg/llm.py".to_string()
}

fn default_speech_script() -> String {
    "./scripts/tts.py".to_string()
}

fn default_audio_extension() -> String {
    "mp3".to_string()
}

fn default_speech_timeout_secs() -> u64 {
    300
}

fn default_background_dir() -> PathBuf {
    PathBuf::from("./resources/videos")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./generated")
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_command_timeout_secs() -> u64 {
    600
}

fn default_max_words_per_caption() -> usize {
    6
}

fn default_force_style() -> String {
    "FontName=FreeSans,Bold=1,FontSize=18,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,Outline=2,Alignment=10".to_string()
}

fn default_caption_script() -> String {
    "./scripts/captions.py".to_string()
}

fn default_pixabay_endpoint() -> String {
    "https://pixabay.com/api".to_string()
}

fn default_per_page() -> u32 {
    3
}

fn default_python_path() -> String {
    "python".to_string()
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;

            debug!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(path, config_json)
            .context(format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(endpoint) = non_empty("OLLAMA_URL") {
            self.text.endpoint = endpoint;
        }
        if let Some(model) = non_empty("OLLAMA_MODEL") {
            self.text.model = model;
        }
        if let Some(endpoint) = non_empty("SPEECH_GENERATION_API") {
            self.speech.endpoint = endpoint;
            self.speech.provider = SpeechProvider::Http;
        }
        // Explicit provider choices win over the endpoint-implied ones
        if let Some(provider) = non_empty("TEXT_PROVIDER") {
            match provider.parse::<TextProvider>() {
                Ok(provider) => self.text.provider = provider,
                Err(e) => warn!("Ignoring TEXT_PROVIDER: {}", e),
            }
        }
        if let Some(provider) = non_empty("SPEECH_PROVIDER") {
            match provider.parse::<SpeechProvider>() {
                Ok(provider) => self.speech.provider = provider,
                Err(e) => warn!("Ignoring SPEECH_PROVIDER: {}", e),
            }
        }
        if let Some(api_key) = non_empty("PIXABAY_API_KEY") {
            self.backgrounds.api_key = api_key;
        }
        if let Some(endpoint) = non_empty("PIXABAY_VIDEO_API") {
            self.backgrounds.endpoint = endpoint;
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.text.narration_template.trim().is_empty() {
            return Err(anyhow!("Narration template must not be empty"));
        }

        match self.text.provider {
            TextProvider::Ollama => {
                Url::parse(&self.text.endpoint)
                    .with_context(|| format!("Invalid Ollama endpoint: {}", self.text.endpoint))?;
                if self.text.model.trim().is_empty() {
                    return Err(anyhow!("A model name is required for the Ollama provider"));
                }
                if let Some(temperature) = self.text.temperature {
                    if !(0.0..=2.0).contains(&temperature) {
                        return Err(anyhow!("Temperature must be between 0.0 and 2.0, got {}", temperature));
                    }
                }
                if self.text.max_tokens == Some(0) {
                    return Err(anyhow!("max_tokens must be at least 1 when set"));
                }
            }
            TextProvider::Script => {
                if self.text.script_path.trim().is_empty() {
                    return Err(anyhow!("A script path is required for the script text provider"));
                }
            }
        }

        match self.speech.provider {
            SpeechProvider::Http => {
                Url::parse(&self.speech.endpoint)
                    .with_context(|| format!("Invalid speech API endpoint: '{}'", self.speech.endpoint))?;
            }
            SpeechProvider::Script => {
                if self.speech.script_path.trim().is_empty() {
                    return Err(anyhow!("A script path is required for the script speech provider"));
                }
            }
        }

        if self.speech.audio_extension.trim().is_empty() {
            return Err(anyhow!("Audio extension must not be empty"));
        }

        if self.video.ffmpeg_path.trim().is_empty() || self.video.ffprobe_path.trim().is_empty() {
            return Err(anyhow!("ffmpeg and ffprobe paths must be set"));
        }

        if self.video.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("Output directory must be set"));
        }

        if self.captions.max_words_per_caption == 0 {
            return Err(anyhow!("max_words_per_caption must be at least 1"));
        }

        if self.captions.mode == CaptionMode::Script && self.captions.script_path.trim().is_empty() {
            return Err(anyhow!("A script path is required for the script caption mode"));
        }

        Ok(())
    }
}
