use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::MediaToolkit;
use crate::errors::CollaboratorError;
use crate::file_utils::FileManager;
use crate::process::CommandRunner;

/// `MediaToolkit` backed by the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
    ffprobe: String,
    // @field: Per-command timeout
    timeout: Duration,
    // @field: ASS style override for burned subtitles
    force_style: String,
}

impl FfmpegToolkit {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ffmpeg: impl Into<String>,
        ffprobe: impl Into<String>,
        timeout: Duration,
        force_style: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout,
            force_style: force_style.into(),
        }
    }

    async fn ffmpeg(&self, arguments: Vec<String>, out: &Path) -> Result<(), CollaboratorError> {
        self.runner.run(&self.ffmpeg, &arguments, self.timeout).await?;
        if !FileManager::file_exists(out) {
            return Err(CollaboratorError::MissingOutput(out.to_path_buf()));
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Parse ffprobe's `format=duration` output (seconds as a decimal)
pub fn parse_probe_duration(raw: &str) -> Result<Duration, CollaboratorError> {
    let trimmed = raw.trim();
    let seconds: f64 = trimmed
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| CollaboratorError::InvalidDuration(trimmed.to_string()))?;

    if seconds <= 0.0 {
        return Err(CollaboratorError::InvalidDuration(trimmed.to_string()));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| CollaboratorError::InvalidDuration(trimmed.to_string()))
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn replace_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let arguments = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(video),
            "-i".to_string(),
            path_arg(audio),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            path_arg(out),
        ];
        self.ffmpeg(arguments, out).await
    }

    async fn probe_duration(&self, media: &Path) -> Result<Duration, CollaboratorError> {
        let arguments = vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path_arg(media),
        ];
        let output = self.runner.run(&self.ffprobe, &arguments, self.timeout).await?;
        parse_probe_duration(&output.stdout)
    }

    async fn trim(&self, input: &Path, duration: Duration, out: &Path) -> Result<(), CollaboratorError> {
        let arguments = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(input),
            "-t".to_string(),
            FileManager::format_media_time(duration),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(out),
        ];
        self.ffmpeg(arguments, out).await
    }

    async fn burn_subtitles(&self, input: &Path, subtitles: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let filter = format!(
            "subtitles={}:force_style='{}'",
            FileManager::escape_filter_path(subtitles),
            self.force_style
        );
        let arguments = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(input),
            "-vf".to_string(),
            filter,
            "-c:a".to_string(),
            "copy".to_string(),
            path_arg(out),
        ];
        self.ffmpeg(arguments, out).await
    }

    async fn export(&self, input: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let arguments = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(input),
            "-codec".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            path_arg(out),
        ];
        self.ffmpeg(arguments, out).await
    }
}
