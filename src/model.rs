use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// What the user wants out of the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// Merged video file (mp4)
    Video,
    /// Audio only, transcoded to MP3
    Audio,
}

/// Video quality choices offered in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoQuality {
    Best,
    P1080,
    P720,
    P480,
    P360,
    P240,
    P144,
    Worst,
}

impl VideoQuality {
    /// Every choice, in the order the combo box lists them
    pub const ALL: [VideoQuality; 8] = [
        VideoQuality::Best,
        VideoQuality::P1080,
        VideoQuality::P720,
        VideoQuality::P480,
        VideoQuality::P360,
        VideoQuality::P240,
        VideoQuality::P144,
        VideoQuality::Worst,
    ];

    /// Height cap in pixels, `None` for the unrestricted choices
    pub fn max_height(self) -> Option<u32> {
        match self {
            VideoQuality::Best | VideoQuality::Worst => None,
            VideoQuality::P1080 => Some(1080),
            VideoQuality::P720 => Some(720),
            VideoQuality::P480 => Some(480),
            VideoQuality::P360 => Some(360),
            VideoQuality::P240 => Some(240),
            VideoQuality::P144 => Some(144),
        }
    }

    /// Format-selection expression understood by yt-dlp
    pub fn format_selector(self) -> String {
        match (self, self.max_height()) {
            (VideoQuality::Worst, _) => "worst".to_owned(),
            (_, Some(h)) => format!("best[height<={h}]"),
            (_, None) => "best".to_owned(),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.max_height()) {
            (VideoQuality::Best, _) => f.write_str("best"),
            (VideoQuality::Worst, _) => f.write_str("worst"),
            (_, Some(h)) => write!(f, "{h}p"),
            (_, None) => Ok(()),
        }
    }
}

/// Target MP3 bitrate; `Best` lets the transcoder pick its maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBitrate {
    Best,
    Kbps256,
    Kbps192,
    Kbps128,
    Kbps96,
}

impl AudioBitrate {
    pub const ALL: [AudioBitrate; 5] = [
        AudioBitrate::Best,
        AudioBitrate::Kbps256,
        AudioBitrate::Kbps192,
        AudioBitrate::Kbps128,
        AudioBitrate::Kbps96,
    ];

    /// Numeric value, 0 meaning best
    pub fn kbps(self) -> u32 {
        match self {
            AudioBitrate::Best => 0,
            AudioBitrate::Kbps256 => 256,
            AudioBitrate::Kbps192 => 192,
            AudioBitrate::Kbps128 => 128,
            AudioBitrate::Kbps96 => 96,
        }
    }

    /// Value for yt-dlp's `--audio-quality`: VBR level 0 or an explicit bitrate
    pub fn engine_quality(self) -> String {
        match self.kbps() {
            0 => "0".to_owned(),
            n => format!("{n}K"),
        }
    }
}

impl fmt::Display for AudioBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kbps() {
            0 => f.write_str("0 (Best)"),
            n => write!(f, "{n}"),
        }
    }
}

/// Everything a single download needs. Built fresh on each click and moved
/// into the worker, so it can't change once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: DownloadMode,
    pub video_quality: VideoQuality,
    pub audio_bitrate: AudioBitrate,
    pub destination: PathBuf,
}

/// Descriptive data about a URL, produced without downloading media
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: String,
    /// Length in whole seconds, `None` when the engine doesn't know
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    /// Raw `YYYYMMDD` as reported by the engine
    pub upload_date: Option<String>,
    /// Heights (in pixels) of the offered video streams
    pub resolutions: BTreeSet<u32>,
    pub thumbnail_url: Option<String>,
}

/// Status update sent from a download worker to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Bytes are moving; fields are display strings straight from the engine
    Downloading { percent: String, rate: String, eta: String },
    /// Engine is merging or transcoding after the transfer
    Postprocessing { detail: String },
    /// Terminal: the output file is in place
    Finished { filename: String },
    /// Terminal: the download or transcode failed
    Failed { message: String },
}

impl ProgressEvent {
    /// Whether this event ends the download it belongs to
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Finished { .. } | ProgressEvent::Failed { .. })
    }
}
