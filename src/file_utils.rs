use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

// @module: File and directory utilities

/// Container extensions treated as background videos
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "mov", "webm", "avi", "m4v"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @checks: File exists and holds at least one byte
    pub fn is_non_empty_file<P: AsRef<Path>>(path: P) -> bool {
        fs::metadata(path).map(|meta| meta.is_file() && meta.len() > 0).unwrap_or(false)
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @checks: Extension is a known video container
    pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// List the video files directly inside `dir`, sorted by path
    ///
    /// An unreadable directory is an error; unrelated files are skipped.
    pub fn list_videos<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::other("Failed to read directory entry"))
            })?;
            let path = entry.path();

            if path.is_file() && Self::is_video_file(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Write bytes to a file, creating the parent directory
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(path, content)
    }

    /// Format a duration as an ffmpeg time specification (HH:MM:SS.mmm)
    pub fn format_media_time(duration: Duration) -> String {
        let ms = duration.as_millis() as u64;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }

    /// Escape a path for use inside an ffmpeg filter argument
    pub fn escape_filter_path<P: AsRef<Path>>(path: P) -> String {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let mut escaped = String::with_capacity(raw.len());
        for c in raw.chars() {
            if matches!(c, ':' | '\'' | ',' | '[' | ']' | ';') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}
