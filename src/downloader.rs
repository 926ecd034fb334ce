use std::io::ErrorKind;
use std::path::Path;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc::{UnboundedSender, unbounded_channel},
};
use tracing::{debug, info, warn};

use crate::error::DownloadError;
use crate::model::{DownloadMode, DownloadRequest, ProgressEvent};
use crate::progress::{EngineLine, parse_line};
use crate::relay::RelaySender;
use crate::ytdlp::{YtDlp, download_args};

/// Runs one download to completion, relaying progress as it goes.
///
/// Exactly one terminal event is sent: `Finished` on success, `Failed` on any
/// error. Returns the output file name.
pub async fn run(
    engine: &YtDlp,
    request: &DownloadRequest,
    progress: &RelaySender,
) -> Result<String, DownloadError> {
    match run_engine(engine, request, progress).await {
        Ok(filename) => {
            info!(%filename, "download finished");
            progress.progress(ProgressEvent::Finished { filename: filename.clone() });
            Ok(filename)
        }
        Err(err) => {
            let message = err.user_message();
            warn!(url = %request.url, %message, "download failed");
            progress.progress(ProgressEvent::Failed { message });
            Err(err)
        }
    }
}

async fn run_engine(
    engine: &YtDlp,
    request: &DownloadRequest,
    progress: &RelaySender,
) -> Result<String, DownloadError> {
    let mode = match request.mode {
        DownloadMode::Video => "video",
        DownloadMode::Audio => "audio",
    };
    info!(url = %request.url, mode, dest = %request.destination.display(), "starting download");

    let mut child = engine
        .command(download_args(request))
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => DownloadError::EngineMissing,
            _ => DownloadError::Io(e),
        })?;

    // Both pipes feed one queue so lines are handled as they arrive
    let (line_tx, mut lines) = unbounded_channel();
    if let Some(out) = child.stdout.take() {
        tokio::spawn(forward_lines(out, line_tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        tokio::spawn(forward_lines(err, line_tx.clone()));
    }
    drop(line_tx);

    let mut tracker = OutputTracker::default();
    while let Some(line) = lines.recv().await {
        debug!("yt-dlp> {}", line);
        if let Some(event) = tracker.observe(&line) {
            progress.progress(event);
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(DownloadError::Engine {
            message: tracker.failure_message(&status.to_string()),
        });
    }
    Ok(tracker.filename())
}

/// Sends each line of `reader` until EOF. Lines are decoded lossily: the
/// engine may print paths in a non-UTF-8 locale, and the pipe must stay
/// drained or the child dies on a full or closed pipe.
async fn forward_lines<R>(reader: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("engine output unreadable: {}", e);
                break;
            }
        }
    }
}

/// Follows engine output to work out the final file and any error text.
#[derive(Debug, Default)]
struct OutputTracker {
    last_path: Option<String>,
    errors: Vec<String>,
}

impl OutputTracker {
    /// Returns the event to relay for this line, if any.
    fn observe(&mut self, line: &str) -> Option<ProgressEvent> {
        match parse_line(line) {
            EngineLine::Event(event) => Some(event),
            EngineLine::Output(path) => {
                self.last_path = Some(path);
                None
            }
            EngineLine::Postprocess { path, detail } => {
                self.last_path = Some(path);
                Some(ProgressEvent::Postprocessing { detail })
            }
            EngineLine::Error(msg) => {
                self.errors.push(msg);
                None
            }
            EngineLine::Other => None,
        }
    }

    /// Base name of the last file the engine wrote
    fn filename(&self) -> String {
        self.last_path
            .as_deref()
            .map(|p| {
                Path::new(p)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.to_owned())
            })
            .unwrap_or_else(|| "(unknown file)".to_owned())
    }

    fn failure_message(&self, status: &str) -> String {
        if self.errors.is_empty() {
            format!("yt-dlp exited with {status}")
        } else {
            self.errors.join("\n")
        }
    }
}
