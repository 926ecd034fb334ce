//! The window: draws [`AppState`] every frame and routes clicks to its handlers.

use eframe::{App, Frame, egui};
use egui::{Align2, Color32, RichText, TextureHandle, TextureOptions};
use rfd::FileDialog;
use std::path::PathBuf;

use crate::config::REPAINT_INTERVAL;
use crate::model::{AudioBitrate, DownloadMode, VideoQuality};
use crate::state::{AppState, Tone};

const HEADER_BG: Color32 = Color32::from_rgb(0x2c, 0x3e, 0x50);
const START_GREEN: Color32 = Color32::from_rgb(0x27, 0xae, 0x60);
const BUSY_ORANGE: Color32 = Color32::from_rgb(0xf3, 0x9c, 0x12);

pub struct DownloaderApp {
    state: AppState,
    /// Uploaded thumbnail and the URL it belongs to
    thumbnail: Option<(String, TextureHandle)>,
}

impl DownloaderApp {
    pub fn new(state: AppState) -> Self {
        Self { state, thumbnail: None }
    }

    fn header(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(HEADER_BG).inner_margin(14.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("🎬 Video Downloader").size(22.0).strong().color(Color32::WHITE));
                    ui.label(
                        RichText::new("Download videos and audio in high quality")
                            .size(13.0)
                            .color(Color32::from_rgb(0xec, 0xf0, 0xf1)),
                    );
                });
            });
    }

    fn url_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("🔗 Video URL").strong());
            ui.add(
                egui::TextEdit::singleline(&mut self.state.url)
                    .hint_text("https://...")
                    .desired_width(f32::INFINITY),
            );
            ui.vertical_centered(|ui| {
                if ui.button("📋 Get Video Info").clicked() {
                    // Errors already became a notice
                    let _ = self.state.fetch_info();
                }
            });
        });
    }

    fn info_section(&mut self, ui: &mut egui::Ui) {
        let Some(meta) = &self.state.metadata else {
            return;
        };
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                let current = meta.thumbnail_url.as_deref();
                if let Some((url, tex)) = &self.thumbnail {
                    if current == Some(url.as_str()) {
                        ui.image(tex);
                    }
                }
                egui::Grid::new("metadata").num_columns(2).spacing([12.0, 4.0]).show(ui, |ui| {
                    for (label, value) in meta.summary() {
                        ui.label(RichText::new(label).strong());
                        ui.label(value);
                        ui.end_row();
                    }
                });
            });
        });
    }

    fn settings_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("⚙ Download Settings").strong());

            ui.horizontal(|ui| {
                ui.label("Download Type:");
                let mut mode = self.state.mode;
                ui.radio_value(&mut mode, DownloadMode::Video, "🎥 Video");
                ui.radio_value(&mut mode, DownloadMode::Audio, "🎵 Audio (MP3)");
                if mode != self.state.mode {
                    self.state.set_mode(mode);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Quality:");
                match self.state.mode {
                    DownloadMode::Video => {
                        egui::ComboBox::from_id_source("video_quality")
                            .selected_text(self.state.video_quality.to_string())
                            .show_ui(ui, |ui| {
                                for q in VideoQuality::ALL {
                                    ui.selectable_value(&mut self.state.video_quality, q, q.to_string());
                                }
                            });
                    }
                    DownloadMode::Audio => {
                        egui::ComboBox::from_id_source("audio_bitrate")
                            .selected_text(self.state.audio_bitrate.to_string())
                            .show_ui(ui, |ui| {
                                for b in AudioBitrate::ALL {
                                    ui.selectable_value(&mut self.state.audio_bitrate, b, b.to_string());
                                }
                            });
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Download Folder:");
                ui.add(egui::TextEdit::singleline(&mut self.state.destination).desired_width(400.0));
                if ui.button("📁 Browse").clicked() {
                    if let Some(folder) = FileDialog::new().set_directory(&self.state.destination).pick_folder() {
                        self.state.destination = folder.display().to_string();
                    }
                }
            });
        });
    }

    fn progress_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("📊 Download Progress").strong());

            if self.state.is_busy() {
                match self.state.fraction {
                    Some(f) => {
                        ui.add(egui::ProgressBar::new(f).show_percentage());
                    }
                    None => {
                        ui.spinner();
                    }
                }
            }

            let tone: Tone = self.state.tone;
            ui.label(RichText::new(&self.state.status).color(tone.color()));
            if !self.state.details.is_empty() {
                ui.label(RichText::new(&self.state.details).small().weak());
            }

            if let Some(dir) = self.state.last_output_dir.clone() {
                if !self.state.is_busy() && ui.button("Open Folder").clicked() {
                    open_folder(dir);
                }
            }
        });
    }

    fn action_button(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            let busy = self.state.is_busy();
            let fill = if busy { BUSY_ORANGE } else { START_GREEN };
            let button = egui::Button::new(
                RichText::new(self.state.action_label()).size(16.0).strong().color(Color32::WHITE),
            )
            .fill(fill)
            .min_size(egui::vec2(220.0, 40.0));
            if ui.add_enabled(!busy, button).clicked() {
                // Errors already became a notice
                let _ = self.state.start_download();
            }
        });
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.state.notice.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let color = if notice.is_error { Tone::Error.color() } else { Tone::Success.color() };
                ui.label(RichText::new(&notice.message).color(color));
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.state.dismiss_notice();
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply worker messages before drawing
        self.state.poll();

        if let Some(image) = self.state.pending_thumbnail.take() {
            if let Some(url) = self.state.metadata.as_ref().and_then(|m| m.thumbnail_url.clone()) {
                let tex = ctx.load_texture("thumbnail", image, TextureOptions::default());
                self.thumbnail = Some((url, tex));
            }
        }

        self.header(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                self.url_section(ui);
                ui.add_space(6.0);
                self.info_section(ui);
                ui.add_space(6.0);
                self.settings_section(ui);
                ui.add_space(6.0);
                self.progress_section(ui);
                ui.add_space(10.0);
                self.action_button(ui);
            });
        });

        self.notice_window(ctx);

        // Keep draining the relay even when nothing else asks for a frame
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

/// Opens a folder in the platform file manager without blocking the UI
fn open_folder(folder: PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            tracing::warn!("could not open {}: {}", folder.display(), e);
        }
    });
}
