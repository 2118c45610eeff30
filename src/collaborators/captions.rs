/*!
 * Caption backends.
 *
 * `SubtitleBurner` turns the narration into an SRT track timed over the spoken
 * duration and burns it with the media toolkit. `ScriptCaptioner` delegates the
 * whole job to an external captioning script.
 */

use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{CaptionJob, Captioner, MediaToolkit};
use crate::errors::CollaboratorError;
use crate::file_utils::FileManager;
use crate::process::{args, CommandRunner};

/// Exponent applied to word length when sharing out display time
const WORD_WEIGHT_EXPONENT: f64 = 0.5;

/// Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// Sequence number, starting at 1
    pub seq_num: usize,
    /// Start time in milliseconds
    pub start_time_ms: u64,
    /// End time in milliseconds
    pub end_time_ms: u64,
    /// Cue text
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        Self {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Split `narration` into cues of at most `max_words` words spread over `duration`
///
/// Cues are contiguous, the last one ends exactly at `duration`, and each cue's
/// share of time grows with the length of its words.
pub fn build_cues(narration: &str, duration: Duration, max_words: usize) -> Vec<SubtitleEntry> {
    let words: Vec<&str> = narration.split_whitespace().collect();
    if words.is_empty() || max_words == 0 {
        return Vec::new();
    }

    let chunks: Vec<&[&str]> = words.chunks(max_words).collect();
    let weights: Vec<f64> = chunks
        .iter()
        .map(|chunk| {
            chunk
                .iter()
                .map(|w| (w.chars().count() as f64).powf(WORD_WEIGHT_EXPONENT))
                .sum()
        })
        .collect();
    let total_weight: f64 = weights.iter().sum();
    let total_ms = duration.as_millis() as u64;

    let mut entries = Vec::with_capacity(chunks.len());
    let mut elapsed_weight = 0.0;
    let mut start_ms = 0;

    for (i, (chunk, weight)) in chunks.iter().zip(&weights).enumerate() {
        elapsed_weight += weight;
        let end_ms = if i + 1 == chunks.len() {
            total_ms
        } else {
            ((total_ms as f64) * elapsed_weight / total_weight).round() as u64
        };
        entries.push(SubtitleEntry::new(i + 1, start_ms, end_ms, chunk.join(" ")));
        start_ms = end_ms;
    }

    entries
}

/// Render cues as an SRT document
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    entries.iter().map(ToString::to_string).collect()
}

/// Burns narration-derived subtitles with the media toolkit
#[derive(Debug, Clone)]
pub struct SubtitleBurner {
    media: Arc<dyn MediaToolkit>,
    max_words_per_caption: usize,
}

impl SubtitleBurner {
    pub fn new(media: Arc<dyn MediaToolkit>, max_words_per_caption: usize) -> Self {
        Self {
            media,
            max_words_per_caption: max_words_per_caption.max(1),
        }
    }
}

#[async_trait]
impl Captioner for SubtitleBurner {
    async fn caption(&self, job: CaptionJob<'_>) -> Result<(), CollaboratorError> {
        let cues = build_cues(job.narration, job.duration, self.max_words_per_caption);
        if cues.is_empty() {
            return Err(CollaboratorError::EmptyOutput("caption track"));
        }

        let srt_path = job.workspace.artifact_path("srt");
        FileManager::write_bytes(&srt_path, render_srt(&cues).as_bytes())?;
        debug!("Wrote {} caption cues to {}", cues.len(), srt_path.display());

        self.media.burn_subtitles(job.video, &srt_path, job.out).await
    }
}

/// External captioning script: `<python> <script> attach <in> <out>`
#[derive(Debug, Clone)]
pub struct ScriptCaptioner {
    runner: Arc<dyn CommandRunner>,
    python: String,
    script: String,
    timeout: Duration,
}

impl ScriptCaptioner {
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

fn lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl Captioner for ScriptCaptioner {
    async fn caption(&self, job: CaptionJob<'_>) -> Result<(), CollaboratorError> {
        let arguments = args([
            self.script.clone(),
            "attach".to_string(),
            lossy(job.video),
            lossy(job.out),
        ]);
        self.runner.run(&self.python, &arguments, self.timeout).await?;

        if !FileManager::file_exists(job.out) {
            return Err(CollaboratorError::MissingOutput(job.out.to_path_buf()));
        }
        Ok(())
    }
}
