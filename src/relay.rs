//! Worker → UI message channel.
//!
//! Workers hold a [`RelaySender`]; the UI thread owns the single
//! [`RelayReceiver`] and drains it once per frame. The channel is unbounded
//! FIFO, so messages arrive in the order each worker sent them and nothing is
//! dropped or merged here.

use eframe::egui::{ColorImage, Context};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::error::ExtractionError;
use crate::model::{ProgressEvent, VideoMetadata};

/// Everything a worker can report back
pub enum WorkerMessage {
    /// Result of a metadata fetch
    Metadata(Result<VideoMetadata, ExtractionError>),
    /// Decoded thumbnail, tagged with the URL it came from
    Thumbnail { url: String, image: ColorImage },
    /// Download progress
    Progress(ProgressEvent),
}

impl std::fmt::Debug for WorkerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerMessage::Metadata(r) => f.debug_tuple("Metadata").field(r).finish(),
            WorkerMessage::Thumbnail { url, image } => f
                .debug_struct("Thumbnail")
                .field("url", url)
                .field("size", &image.size)
                .finish(),
            WorkerMessage::Progress(ev) => f.debug_tuple("Progress").field(ev).finish(),
        }
    }
}

/// Cloneable sending half handed to workers
#[derive(Clone)]
pub struct RelaySender {
    tx: UnboundedSender<WorkerMessage>,
    /// Wakes the UI so it doesn't wait for the next periodic repaint
    repaint: Option<Context>,
}

impl RelaySender {
    /// Sends a message. Returns `false` once the UI side is gone.
    pub fn send(&self, msg: WorkerMessage) -> bool {
        let delivered = self.tx.send(msg).is_ok();
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
        delivered
    }

    pub fn progress(&self, event: ProgressEvent) -> bool {
        self.send(WorkerMessage::Progress(event))
    }
}

/// Receiving half, owned by the UI thread
pub struct RelayReceiver {
    rx: UnboundedReceiver<WorkerMessage>,
}

impl RelayReceiver {
    /// Everything queued right now, oldest first. Never blocks.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// Creates a connected pair. Pass the egui context to get repaint-on-send.
pub fn channel(repaint: Option<Context>) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = unbounded_channel();
    (RelaySender { tx, repaint }, RelayReceiver { rx })
}
