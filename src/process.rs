/*!
 * External program execution.
 *
 * Every script and media binary the collaborators invoke goes through the
 * `CommandRunner` capability, so adapters can be exercised with a scripted
 * runner instead of real processes.
 */

use async_trait::async_trait;
use log::{debug, error};
use std::fmt::Debug;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::CommandError;

/// Captured output of a successful program run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

/// Runs an external program to completion
#[async_trait]
pub trait CommandRunner: Send + Sync + Debug {
    /// Run `program` with `args`, failing on spawn errors, non-zero exit or timeout
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput, CommandError>;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Default, Clone)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput, CommandError> {
        debug!("Running: {} {}", program, args.join(" "));

        // kill_on_drop reaps the child when the timeout branch wins
        let child_future = Command::new(program).args(args).kill_on_drop(true).output();

        let output = tokio::select! {
            result = child_future => {
                result.map_err(|source| CommandError::Spawn {
                    program: program.to_string(),
                    source,
                })?
            },
            _ = tokio::time::sleep(timeout) => {
                error!("{} timed out after {}s", program, timeout.as_secs());
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let filtered = filter_tool_stderr(&stderr);
            error!("{} failed ({}): {}", program, output.status, filtered);
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: filtered,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Keep only meaningful error lines from ffmpeg-style stderr, stripping the
/// version banner, build configuration and stream metadata noise.
pub fn filter_tool_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "handler_name",
        "vendor_id",
        "encoder",
        "major_brand",
        "minor_version",
        "compatible_brands",
        "creation_time",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Convert string-like arguments into the owned form `CommandRunner` takes
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
