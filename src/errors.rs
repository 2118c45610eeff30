/*!
 * Error types for the vidnarrate application.
 *
 * This module contains custom error types for the different layers of the
 * generation pipeline, using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Identity of a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Narration text generation
    Text,
    /// Speech synthesis
    Speech,
    /// Video composition
    Video,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Speech => "speech",
            Self::Video => "video",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors raised while running an external program
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The program did not finish in time and was killed
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Failure reported by an external collaborator (model endpoint, script, media tool)
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// An HTTP provider failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A subprocess failed
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The collaborator reported success but left no file behind
    #[error("Expected output file was not produced: {0}")]
    MissingOutput(PathBuf),

    /// The collaborator produced nothing usable
    #[error("Collaborator returned an empty {0}")]
    EmptyOutput(&'static str),

    /// The background pool holds no video file
    #[error("No background videos found in {0}")]
    NoBackgrounds(PathBuf),

    /// The background directory could not be listed
    #[error("Failed to list background videos in {dir}: {source}")]
    AssetListing {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A media probe returned something that is not a duration
    #[error("Invalid media duration: {0:?}")]
    InvalidDuration(String),

    /// Local file handling around a collaborator call failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by a pipeline run
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Malformed or absent context data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage's collaborator failed; the run was aborted at that stage
    #[error("{stage} stage failed: {source}")]
    CollaboratorFailure {
        stage: StageKind,
        #[source]
        source: CollaboratorError,
    },

    /// Workspace or output directory handling failed
    #[error("Failed to {action}: {source}")]
    ResourceFailure {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl GenerationError {
    /// Tag a collaborator failure with the stage it aborted
    pub fn collaborator(stage: StageKind, source: impl Into<CollaboratorError>) -> Self {
        Self::CollaboratorFailure {
            stage,
            source: source.into(),
        }
    }

    /// Wrap an I/O failure on a pipeline-owned resource
    pub fn resource(action: impl Into<String>, source: std::io::Error) -> Self {
        Self::ResourceFailure {
            action: action.into(),
            source,
        }
    }

    /// Stage that failed, if the failure came from a collaborator
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::CollaboratorFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a pipeline run
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

// Utility functions for error conversion
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
