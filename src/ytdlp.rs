//! Locating the yt-dlp / ffmpeg executables and building engine arguments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{FFMPEG_BIN, YTDLP_BIN};
use crate::model::{DownloadMode, DownloadRequest};
use crate::progress::PROGRESS_TEMPLATE;

/// Handle to the external extraction engine
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Finds yt-dlp on PATH or in a handful of usual install locations,
    /// falling back to the bare name so a missing engine surfaces on spawn.
    /// Also returns the version the engine reported, `None` if none could run.
    pub fn discover() -> (Self, Option<String>) {
        if let Some(version) = engine_version(Path::new(YTDLP_BIN)) {
            return (Self::new(YTDLP_BIN), Some(version));
        }
        for candidate in install_candidates() {
            if candidate.is_file() {
                info!("using yt-dlp at {}", candidate.display());
                let version = engine_version(&candidate);
                return (Self::new(candidate), version);
            }
        }
        debug!("yt-dlp not found in known locations, relying on PATH");
        (Self::new(YTDLP_BIN), None)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command preset for the given arguments with captured output
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Runs `program --version` and returns its trimmed output
fn engine_version(program: &Path) -> Option<String> {
    let out = std::process::Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let v = String::from_utf8_lossy(&out.stdout).trim().to_owned();
    (!v.is_empty()).then_some(v)
}

fn install_candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
        .iter()
        .map(|dir| Path::new(dir).join(YTDLP_BIN))
        .collect();

    // pip --user installs on Windows
    #[cfg(windows)]
    {
        for var in ["APPDATA", "LOCALAPPDATA"] {
            if let Ok(base) = std::env::var(var) {
                let python = PathBuf::from(base).join("Python");
                if let Ok(entries) = std::fs::read_dir(&python) {
                    for entry in entries.flatten() {
                        out.push(entry.path().join("Scripts").join(YTDLP_BIN));
                    }
                }
            }
        }
    }

    out
}

/// Whether ffmpeg can be run. Only needed for audio extraction and merging.
pub fn ffmpeg_available() -> bool {
    std::process::Command::new(FFMPEG_BIN)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Arguments for "extract metadata without downloading"
pub fn metadata_args(url: &str) -> Vec<String> {
    vec![
        "--dump-json".to_owned(),
        "--no-playlist".to_owned(),
        "--no-warnings".to_owned(),
        "--".to_owned(),
        url.to_owned(),
    ]
}

/// Arguments for a download, including format selection and post-processing
pub fn download_args(request: &DownloadRequest) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    match request.mode {
        DownloadMode::Video => {
            args.push("-f".to_owned());
            args.push(request.video_quality.format_selector());
            args.push("--merge-output-format".to_owned());
            args.push("mp4".to_owned());
        }
        DownloadMode::Audio => {
            args.push("-f".to_owned());
            args.push("bestaudio/best".to_owned());
            args.push("-x".to_owned());
            args.push("--audio-format".to_owned());
            args.push("mp3".to_owned());
            args.push("--audio-quality".to_owned());
            args.push(request.audio_bitrate.engine_quality());
        }
    }

    args.push("--newline".to_owned());
    args.push("--no-colors".to_owned());
    args.push("--no-playlist".to_owned());
    args.push("--progress-template".to_owned());
    args.push(PROGRESS_TEMPLATE.to_owned());

    args.push("-o".to_owned());
    args.push(
        request
            .destination
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned(),
    );
    // Keeps URLs starting with '-' from being read as options
    args.push("--".to_owned());
    args.push(request.url.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioBitrate, VideoQuality};

    fn request(mode: DownloadMode) -> DownloadRequest {
        DownloadRequest {
            url: "https://example.com/watch?v=abc".into(),
            mode,
            video_quality: VideoQuality::P720,
            audio_bitrate: AudioBitrate::Kbps192,
            destination: PathBuf::from("/tmp/out"),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        let i = args.iter().position(|a| a == flag)?;
        args.get(i + 1).map(String::as_str)
    }

    #[test]
    fn video_args_select_height_and_mp4() {
        let args = download_args(&request(DownloadMode::Video));
        assert_eq!(value_after(&args, "-f"), Some("best[height<=720]"));
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert!(!args.iter().any(|a| a == "-x"));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/watch?v=abc"));
    }

    #[test]
    fn audio_args_extract_mp3_at_bitrate() {
        let args = download_args(&request(DownloadMode::Audio));
        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert!(args.iter().any(|a| a == "-x"));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("192K"));
    }

    #[test]
    fn output_template_lands_in_destination() {
        let args = download_args(&request(DownloadMode::Video));
        let expected = PathBuf::from("/tmp/out").join("%(title)s.%(ext)s");
        assert_eq!(value_after(&args, "-o"), Some(expected.to_string_lossy().as_ref()));
        assert_eq!(value_after(&args, "--progress-template"), Some(PROGRESS_TEMPLATE));
    }

    #[test]
    fn metadata_args_never_download() {
        let args = metadata_args("https://example.com/v");
        assert!(args.contains(&"--dump-json".to_owned()));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[test]
    fn version_is_none_for_missing_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(engine_version(&dir.path().join("no-such-engine")), None);
    }

    #[cfg(unix)]
    #[test]
    fn version_is_read_from_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let ok = dir.path().join("engine-ok");
        std::fs::write(&ok, "#!/bin/sh\necho '  2024.08.06  '\n").expect("write script");
        std::fs::set_permissions(&ok, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        assert_eq!(engine_version(&ok).as_deref(), Some("2024.08.06"));

        let bad = dir.path().join("engine-bad");
        std::fs::write(&bad, "#!/bin/sh\necho 2024.08.06\nexit 2\n").expect("write script");
        std::fs::set_permissions(&bad, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        assert_eq!(engine_version(&bad), None);
    }
}
