//! Built-in defaults. Nothing is persisted; every setting resets on restart.

use std::path::PathBuf;
use std::time::Duration;

use crate::model::{AudioBitrate, DownloadMode, VideoQuality};

/// Window title shown by the OS.
pub const APP_TITLE: &str = "SnapGrab Video Downloader";

/// Initial inner window size.
pub const WINDOW_SIZE: [f32; 2] = [800.0, 700.0];

/// How often the UI wakes up to drain the relay even without new messages.
pub const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Thumbnails are downscaled to fit inside this box.
pub const THUMBNAIL_MAX: (u32, u32) = (320, 180);

/// Executable name of the extraction engine.
pub const YTDLP_BIN: &str = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };

/// Executable name of the transcoder used by the engine's post-processing.
pub const FFMPEG_BIN: &str = if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" };

/// Form values at startup.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub mode: DownloadMode,
    pub video_quality: VideoQuality,
    pub audio_bitrate: AudioBitrate,
    pub destination: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            mode: DownloadMode::Video,
            video_quality: VideoQuality::Best,
            audio_bitrate: AudioBitrate::Best,
            // Falls back to "." when the working directory was removed under us
            destination: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
