//! Application state and the handlers that mutate it.
//!
//! Only the UI thread touches [`AppState`]. Workers are started through a
//! [`Dispatch`] and report back through the relay, which [`AppState::poll`]
//! drains once per frame.

use std::path::PathBuf;

use eframe::egui::{Color32, ColorImage, Context};
use tracing::{info, warn};

use crate::config::Defaults;
use crate::error::ValidationError;
use crate::model::{AudioBitrate, DownloadMode, DownloadRequest, ProgressEvent, VideoMetadata, VideoQuality};
use crate::progress::percent_fraction;
use crate::relay::{self, RelayReceiver, RelaySender, WorkerMessage};
use crate::worker::Dispatch;

pub const IDLE_LABEL: &str = "🚀 Start Download";
pub const BUSY_LABEL: &str = "⏳ Downloading...";

/// Colour of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Working,
    Pending,
    Success,
    Error,
}

impl Tone {
    pub fn color(self) -> Color32 {
        match self {
            Tone::Neutral => Color32::from_rgb(0x7f, 0x8c, 0x8d),
            Tone::Working => Color32::from_rgb(0x34, 0x98, 0xdb),
            Tone::Pending => Color32::from_rgb(0xf3, 0x9c, 0x12),
            Tone::Success => Color32::from_rgb(0x27, 0xae, 0x60),
            Tone::Error => Color32::from_rgb(0xe7, 0x4c, 0x3c),
        }
    }
}

/// A modal message waiting to be acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self { title: "Success", message: message.into(), is_error: false }
    }

    fn error(message: impl Into<String>) -> Self {
        Self { title: "Error", message: message.into(), is_error: true }
    }
}

pub struct AppState {
    // Form values
    pub url: String,
    pub mode: DownloadMode,
    pub video_quality: VideoQuality,
    pub audio_bitrate: AudioBitrate,
    pub destination: String,

    // Feedback
    pub status: String,
    pub tone: Tone,
    pub details: String,
    /// Fraction for the progress bar, `None` when the percent didn't parse
    pub fraction: Option<f32>,
    pub metadata: Option<VideoMetadata>,
    /// Thumbnail not yet uploaded to the GPU
    pub pending_thumbnail: Option<ColorImage>,
    pub notice: Option<Notice>,
    /// Folder of the last successful download, for "Open Folder"
    pub last_output_dir: Option<PathBuf>,
    /// Result of the startup ffmpeg check; audio mode warns when false
    pub ffmpeg_available: bool,

    busy: bool,
    /// Destination of the download in flight
    active_destination: Option<PathBuf>,
    dispatcher: Box<dyn Dispatch>,
    tx: RelaySender,
    rx: RelayReceiver,
}

impl AppState {
    pub fn new(dispatcher: Box<dyn Dispatch>, repaint: Option<Context>) -> Self {
        let defaults = Defaults::default();
        let (tx, rx) = relay::channel(repaint);
        Self {
            url: String::new(),
            mode: defaults.mode,
            video_quality: defaults.video_quality,
            audio_bitrate: defaults.audio_bitrate,
            destination: defaults.destination.display().to_string(),
            status: "Ready to download".to_owned(),
            tone: Tone::Neutral,
            details: String::new(),
            fraction: None,
            metadata: None,
            pending_thumbnail: None,
            notice: None,
            last_output_dir: None,
            ffmpeg_available: true,
            busy: false,
            active_destination: None,
            dispatcher,
            tx,
            rx,
        }
    }

    /// Whether a download is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Label for the action button
    pub fn action_label(&self) -> &'static str {
        if self.busy { BUSY_LABEL } else { IDLE_LABEL }
    }

    pub fn set_status(&mut self, text: impl Into<String>, tone: Tone) {
        self.status = text.into();
        self.tone = tone;
    }

    /// Status updates from metadata fetches; the download owns the line while busy.
    fn set_info_status(&mut self, text: &str, tone: Tone) {
        if !self.busy {
            self.set_status(text, tone);
        }
    }

    /// Records the startup tool check in the status line.
    pub fn report_tools(&mut self, ytdlp_version: Option<String>, ffmpeg_available: bool) {
        self.ffmpeg_available = ffmpeg_available;
        match ytdlp_version {
            Some(v) => self.set_status(format!("Ready to download (yt-dlp {v})"), Tone::Neutral),
            None => self.set_status("yt-dlp not found: install it to enable downloads", Tone::Error),
        }
    }

    /// Mode radio handler
    pub fn set_mode(&mut self, mode: DownloadMode) {
        self.mode = mode;
        if mode == DownloadMode::Audio && !self.ffmpeg_available && !self.busy {
            self.set_status("FFmpeg not found: MP3 conversion will fail", Tone::Pending);
        }
    }

    fn validated_url(&self) -> Result<String, ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        Ok(url.to_owned())
    }

    /// Snapshot of the form as a request, after validation
    pub fn build_request(&self) -> Result<DownloadRequest, ValidationError> {
        let url = self.validated_url()?;
        let destination = PathBuf::from(self.destination.trim());
        if !destination.is_dir() {
            return Err(ValidationError::MissingDestination(destination));
        }
        Ok(DownloadRequest {
            url,
            mode: self.mode,
            video_quality: self.video_quality,
            audio_bitrate: self.audio_bitrate,
            destination,
        })
    }

    /// "Get Video Info" handler. Fetches may overlap each other and a download.
    pub fn fetch_info(&mut self) -> Result<(), ValidationError> {
        let url = match self.validated_url() {
            Ok(url) => url,
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return Err(e);
            }
        };
        info!(%url, "dispatching metadata fetch");
        self.set_info_status("Fetching video information...", Tone::Pending);
        self.dispatcher.fetch_metadata(url, self.tx.clone());
        Ok(())
    }

    /// "Start Download" handler. Ignored while a download is running.
    pub fn start_download(&mut self) -> Result<(), ValidationError> {
        if self.busy {
            return Err(ValidationError::Busy);
        }
        let request = match self.build_request() {
            Ok(r) => r,
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        self.busy = true;
        self.fraction = None;
        self.details.clear();
        let what = match request.mode {
            DownloadMode::Video => "Starting video download...",
            DownloadMode::Audio => "Starting audio download and conversion...",
        };
        self.set_status(what, Tone::Working);
        info!(url = %request.url, "dispatching download");
        self.active_destination = Some(request.destination.clone());
        self.dispatcher.download(request, self.tx.clone());
        Ok(())
    }

    /// Applies everything the workers sent since the last frame, in order.
    pub fn poll(&mut self) {
        for msg in self.rx.drain() {
            self.handle(msg);
        }
    }

    pub fn handle(&mut self, msg: WorkerMessage) {
        match msg {
            WorkerMessage::Metadata(Ok(meta)) => {
                self.metadata = Some(meta);
                self.pending_thumbnail = None;
                self.set_info_status("Video information loaded successfully!", Tone::Success);
            }
            WorkerMessage::Metadata(Err(e)) => {
                warn!("metadata fetch failed: {}", e);
                self.notice = Some(Notice::error(format!("Failed to get video info: {e}")));
                self.set_info_status("Failed to get video information", Tone::Error);
            }
            WorkerMessage::Thumbnail { url, image } => {
                let current = self.metadata.as_ref().and_then(|m| m.thumbnail_url.as_deref());
                if current == Some(url.as_str()) {
                    self.pending_thumbnail = Some(image);
                }
            }
            WorkerMessage::Progress(event) => self.handle_progress(event),
        }
    }

    fn handle_progress(&mut self, event: ProgressEvent) {
        let terminal = event.is_terminal();
        match event {
            ProgressEvent::Downloading { percent, rate, eta } => {
                self.fraction = percent_fraction(&percent);
                self.set_status(format!("Downloading... {percent}"), Tone::Working);
                self.details = format!("Speed: {rate} | ETA: {eta}");
            }
            ProgressEvent::Postprocessing { detail } => {
                self.fraction = None;
                self.details = detail;
            }
            ProgressEvent::Finished { filename } => {
                self.last_output_dir = self.active_destination.clone();
                self.notice = Some(Notice::info(format!(
                    "Download completed successfully!\n{filename}"
                )));
                self.set_status("Download completed successfully!", Tone::Success);
            }
            ProgressEvent::Failed { message } => {
                self.notice = Some(Notice::error(format!("Download failed: {message}")));
                self.set_status("Download failed", Tone::Error);
            }
        }
        if terminal {
            self.download_completed();
        }
    }

    /// Runs on every terminal event, whatever the outcome
    fn download_completed(&mut self) {
        self.busy = false;
        self.active_destination = None;
        self.fraction = None;
        self.details.clear();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
