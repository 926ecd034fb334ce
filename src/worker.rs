//! Background workers. The UI only talks to them through [`Dispatch`];
//! they only talk back through the relay.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::model::{DownloadRequest, ProgressEvent};
use crate::relay::{RelaySender, WorkerMessage};
use crate::ytdlp::YtDlp;
use crate::{downloader, metadata, thumbnail};

/// Starts background work. Calls return immediately; results come back
/// through the given sender.
pub trait Dispatch {
    /// Fetch metadata (and the thumbnail, if any) for `url`.
    fn fetch_metadata(&self, url: String, tx: RelaySender);
    /// Run one download. Must end with exactly one terminal progress event.
    fn download(&self, request: DownloadRequest, tx: RelaySender);
}

/// Spawns workers as tasks on the shared tokio runtime
pub struct RuntimeDispatcher {
    runtime: Arc<Runtime>,
    engine: Arc<YtDlp>,
}

impl RuntimeDispatcher {
    pub fn new(runtime: Arc<Runtime>, engine: YtDlp) -> Self {
        Self { runtime, engine: Arc::new(engine) }
    }
}

impl Dispatch for RuntimeDispatcher {
    fn fetch_metadata(&self, url: String, tx: RelaySender) {
        let engine = Arc::clone(&self.engine);
        self.runtime.spawn(async move {
            let result = metadata::fetch(&engine, &url).await;
            let thumb_url = result.as_ref().ok().and_then(|m| m.thumbnail_url.clone());
            tx.send(WorkerMessage::Metadata(result));

            if let Some(thumb_url) = thumb_url {
                let fetched = {
                    let thumb_url = thumb_url.clone();
                    tokio::task::spawn_blocking(move || thumbnail::fetch_thumbnail(&thumb_url)).await
                };
                if let Ok(Some(image)) = fetched {
                    tx.send(WorkerMessage::Thumbnail { url: thumb_url, image });
                }
            }
        });
    }

    fn download(&self, request: DownloadRequest, tx: RelaySender) {
        let engine = Arc::clone(&self.engine);
        let task_tx = tx.clone();
        let handle = self.runtime.spawn(async move {
            // Errors are already relayed as Failed inside run()
            let _ = downloader::run(&engine, &request, &task_tx).await;
        });

        self.runtime.spawn(watch_download(handle, tx));
    }
}

/// A panicking download task never sends its terminal event; send one for it.
async fn watch_download(handle: JoinHandle<()>, tx: RelaySender) {
    match handle.await {
        Ok(()) => info!("download worker exited"),
        Err(join_err) => {
            error!("download worker crashed: {}", join_err);
            tx.progress(ProgressEvent::Failed {
                message: format!("internal error ({join_err})"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioBitrate, DownloadMode, VideoQuality};
    use crate::relay;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn runtime() -> Arc<Runtime> {
        Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("runtime"),
        )
    }

    fn wait_for(rx: &mut relay::RelayReceiver, count: usize) -> Vec<WorkerMessage> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut got = Vec::new();
        while got.len() < count && Instant::now() < deadline {
            got.extend(rx.drain());
            std::thread::sleep(Duration::from_millis(10));
        }
        got
    }

    #[test]
    fn download_with_missing_engine_ends_in_failed() {
        let dispatcher = RuntimeDispatcher::new(runtime(), YtDlp::new("/definitely/not/here/yt-dlp"));
        let (tx, mut rx) = relay::channel(None);
        dispatcher.download(
            DownloadRequest {
                url: "https://example.com/v".into(),
                mode: DownloadMode::Video,
                video_quality: VideoQuality::P480,
                audio_bitrate: AudioBitrate::Best,
                destination: PathBuf::from("."),
            },
            tx,
        );

        let msgs = wait_for(&mut rx, 1);
        assert!(matches!(
            msgs.first(),
            Some(WorkerMessage::Progress(ProgressEvent::Failed { .. }))
        ));
    }

    #[tokio::test]
    async fn crashed_download_still_ends_in_failed() {
        let (tx, mut rx) = relay::channel(None);
        let handle: JoinHandle<()> = tokio::spawn(async { panic!("worker blew up") });
        watch_download(handle, tx).await;

        let msgs = rx.drain();
        assert_eq!(msgs.len(), 1);
        match &msgs[0] {
            WorkerMessage::Progress(ProgressEvent::Failed { message }) => {
                assert!(message.starts_with("internal error"));
                assert!(!message.contains("Download failed"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn metadata_with_missing_engine_reports_error() {
        let dispatcher = RuntimeDispatcher::new(runtime(), YtDlp::new("/definitely/not/here/yt-dlp"));
        let (tx, mut rx) = relay::channel(None);
        dispatcher.fetch_metadata("https://example.com/v".into(), tx);

        let msgs = wait_for(&mut rx, 1);
        assert!(matches!(msgs.first(), Some(WorkerMessage::Metadata(Err(_)))));
    }
}
