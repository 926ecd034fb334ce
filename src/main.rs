//! Desktop front-end for yt-dlp: inspect a video URL and download it as
//! video or MP3 with live progress.

// Window and per-frame drawing
mod app;
// Built-in defaults
mod config;
// Download orchestration (yt-dlp child process)
mod downloader;
// Error taxonomy
mod error;
// Metadata fetching and formatting
mod metadata;
// Data model shared by UI and workers
mod model;
// Engine output parsing
mod progress;
// Worker → UI channel
mod relay;
// UI-thread state and handlers
mod state;
// Thumbnail fetching
mod thumbnail;
// Background task spawning
mod worker;
// Engine discovery and arguments
mod ytdlp;

use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use eframe::egui::{self, Visuals};
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use app::DownloaderApp;
use state::AppState;
use worker::RuntimeDispatcher;
use ytdlp::YtDlp;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

fn runtime() -> anyhow::Result<Arc<Runtime>> {
    RUNTIME
        .get_or_try_init(|| Runtime::new().map(Arc::new))
        .cloned()
        .context("failed to start the background runtime")
}

/// Program entry point: initializes logging and runtime, checks tools, launches GUI
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let rt = runtime()?;

    let (engine, version) = YtDlp::discover();
    match &version {
        Some(v) => info!("yt-dlp {} at {}", v, engine.program().display()),
        None => warn!("yt-dlp is not runnable ({})", engine.program().display()),
    }
    let ffmpeg = ytdlp::ffmpeg_available();
    if !ffmpeg {
        warn!("ffmpeg not found; merging and MP3 conversion will fail");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config::APP_TITLE)
            .with_inner_size(config::WINDOW_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        config::APP_TITLE,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::light());
            let dispatcher = RuntimeDispatcher::new(rt, engine);
            let mut state = AppState::new(Box::new(dispatcher), Some(cc.egui_ctx.clone()));
            state.report_tools(version, ffmpeg);
            Box::new(DownloaderApp::new(state))
        }),
    )
    .map_err(|e| anyhow!("window failed: {e}"))
}
