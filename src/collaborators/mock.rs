/*!
 * Mock collaborators for testing.
 *
 * These fakes simulate the external world without running processes or
 * network calls:
 * - `RecordingRunner` - scripted `CommandRunner` that records invocations
 * - `MockTextGenerator` / `MockSpeechSynthesizer` - canned text and audio
 * - `MockMediaToolkit` - writes placeholder media and records each operation;
 *   a failing operation leaves a truncated output file behind
 * - `MockCaptioner` - copies the video and counts calls
 *
 * Every mock counts its calls so tests can check which stages ran.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{CaptionJob, Captioner, MediaToolkit, SpeechSynthesizer, TextGenerator};
use crate::errors::{CollaboratorError, CommandError, ProviderError};
use crate::process::{CommandOutput, CommandRunner};

/// Placeholder bytes written by the media fakes
pub const FAKE_MEDIA: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-media";

/// Behavior mode for the collaborator mocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Reports success but produces nothing
    Empty,
}

/// One recorded `CommandRunner` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Behavior of the recording runner
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerBehavior {
    /// Succeed with this stdout
    Stdout(String),
    /// Succeed and write placeholder media to the last argument
    WriteLastArg,
    /// Exit unsuccessfully
    Fail,
    /// Report a timeout
    TimeOut,
}

/// Scripted `CommandRunner`
#[derive(Debug)]
pub struct RecordingRunner {
    behavior: RunnerBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    pub fn new(behavior: RunnerBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every invocation so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput, CommandError> {
        self.calls.lock().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
        });

        match &self.behavior {
            RunnerBehavior::Stdout(stdout) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            RunnerBehavior::WriteLastArg => {
                if let Some(last) = args.last() {
                    std::fs::write(last, FAKE_MEDIA).map_err(|source| CommandError::Spawn {
                        program: program.to_string(),
                        source,
                    })?;
                }
                Ok(CommandOutput::default())
            }
            RunnerBehavior::Fail => Err(CommandError::Failed {
                program: program.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            }),
            RunnerBehavior::TimeOut => Err(CommandError::TimedOut {
                program: program.to_string(),
                timeout,
            }),
        }
    }
}

/// Text generator returning a fixed narration
#[derive(Debug)]
pub struct MockTextGenerator {
    behavior: MockBehavior,
    reply: String,
    calls: Arc<AtomicUsize>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(behavior: MockBehavior, reply: impl Into<String>) -> Self {
        Self {
            behavior,
            reply: reply.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a working generator that always replies with `reply`
    pub fn working(reply: impl Into<String>) -> Self {
        Self::new(MockBehavior::Working, reply)
    }

    /// Create a generator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, "")
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match self.behavior {
            MockBehavior::Working => Ok(self.reply.clone()),
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated model outage".to_string()).into()),
            MockBehavior::Empty => Ok(String::new()),
        }
    }
}

/// Speech synthesizer writing placeholder audio
#[derive(Debug)]
pub struct MockSpeechSynthesizer {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl MockSpeechSynthesizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            destinations: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Destination paths requested so far
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn synthesize(&self, _text: &str, dest: &Path) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.destinations.lock().push(dest.to_path_buf());

        match self.behavior {
            MockBehavior::Working => {
                std::fs::write(dest, FAKE_MEDIA)?;
                Ok(())
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated TTS outage".to_string(),
            }
            .into()),
            MockBehavior::Empty => Err(CollaboratorError::MissingOutput(dest.to_path_buf())),
        }
    }
}

/// Media operation names, for targeted failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOp {
    ReplaceAudio,
    Probe,
    Trim,
    BurnSubtitles,
    Export,
}

/// One recorded media operation
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    ReplaceAudio { video: PathBuf, audio: PathBuf, out: PathBuf },
    Probe { media: PathBuf },
    Trim { input: PathBuf, duration: Duration, out: PathBuf },
    BurnSubtitles { input: PathBuf, subtitles: PathBuf, out: PathBuf },
    Export { input: PathBuf, out: PathBuf },
}

/// Media toolkit that writes placeholder files
#[derive(Debug)]
pub struct MockMediaToolkit {
    // @field: Duration reported for every probed file
    duration: Duration,
    fail_on: Option<MediaOp>,
    calls: Mutex<Vec<MediaCall>>,
}

impl MockMediaToolkit {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make one operation fail
    pub fn failing_on(mut self, op: MediaOp) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    // A failing operation still leaves a truncated `out`, as a killed ffmpeg would
    fn record(&self, op: MediaOp, call: MediaCall, out: Option<&Path>) -> Result<(), CollaboratorError> {
        self.calls.lock().push(call);
        if self.fail_on == Some(op) {
            if let Some(out) = out {
                std::fs::write(out, &FAKE_MEDIA[..4])?;
            }
            return Err(CommandError::TimedOut {
                program: "ffmpeg".to_string(),
                timeout: Duration::from_secs(1),
            }
            .into());
        }
        if let Some(out) = out {
            std::fs::write(out, FAKE_MEDIA)?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for MockMediaToolkit {
    async fn replace_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let call = MediaCall::ReplaceAudio {
            video: video.to_path_buf(),
            audio: audio.to_path_buf(),
            out: out.to_path_buf(),
        };
        self.record(MediaOp::ReplaceAudio, call, Some(out))
    }

    async fn probe_duration(&self, media: &Path) -> Result<Duration, CollaboratorError> {
        let call = MediaCall::Probe {
            media: media.to_path_buf(),
        };
        self.record(MediaOp::Probe, call, None)?;
        Ok(self.duration)
    }

    async fn trim(&self, input: &Path, duration: Duration, out: &Path) -> Result<(), CollaboratorError> {
        let call = MediaCall::Trim {
            input: input.to_path_buf(),
            duration,
            out: out.to_path_buf(),
        };
        self.record(MediaOp::Trim, call, Some(out))
    }

    async fn burn_subtitles(&self, input: &Path, subtitles: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let call = MediaCall::BurnSubtitles {
            input: input.to_path_buf(),
            subtitles: subtitles.to_path_buf(),
            out: out.to_path_buf(),
        };
        self.record(MediaOp::BurnSubtitles, call, Some(out))
    }

    async fn export(&self, input: &Path, out: &Path) -> Result<(), CollaboratorError> {
        let call = MediaCall::Export {
            input: input.to_path_buf(),
            out: out.to_path_buf(),
        };
        self.record(MediaOp::Export, call, Some(out))
    }
}

/// Captioner that copies the input video
#[derive(Debug)]
pub struct MockCaptioner {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockCaptioner {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Captioner for MockCaptioner {
    async fn caption(&self, job: CaptionJob<'_>) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Working => {
                std::fs::copy(job.video, job.out)?;
                Ok(())
            }
            MockBehavior::Failing => Err(CommandError::Failed {
                program: "captions".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "simulated captioning failure".to_string(),
            }
            .into()),
            MockBehavior::Empty => Err(CollaboratorError::MissingOutput(job.out.to_path_buf())),
        }
    }
}
