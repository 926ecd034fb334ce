use std::path::PathBuf;

use thiserror::Error;

/// Hint appended when a failure looks like a missing transcoder.
pub const FFMPEG_HINT: &str = "Note: Audio conversion requires FFmpeg to be installed.";

/// Rejected before any worker is spawned
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a video URL!")]
    EmptyUrl,
    #[error("Download folder does not exist: {}", .0.display())]
    MissingDestination(PathBuf),
    /// A download is already running; silently ignored by the UI
    #[error("A download is already in progress")]
    Busy,
}

/// Metadata fetch failures
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("yt-dlp was not found. Install it (e.g. `pip install yt-dlp`) and make sure it is on PATH")]
    EngineMissing,
    #[error("{0}")]
    Engine(String),
    #[error("could not read engine output: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download or transcode failures
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("yt-dlp was not found. Install it (e.g. `pip install yt-dlp`) and make sure it is on PATH")]
    EngineMissing,
    #[error("{message}")]
    Engine { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Text shown to the user. Appends [`FFMPEG_HINT`] when the message
    /// mentions ffmpeg; the engine gives no structured code for this, so the
    /// hint can fire on unrelated errors that happen to mention it.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.to_lowercase().contains("ffmpeg") {
            format!("{message}\n{FFMPEG_HINT}")
        } else {
            message
        }
    }
}
