//! Parsing of yt-dlp output lines.
//!
//! Progress comes from our own `--progress-template`, which prints
//! `progress|<percent>|<speed>|<eta>` on every update. Everything else is the
//! engine's regular status output, of which we only care about the lines that
//! name the file being written.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ProgressEvent;

/// Prefix emitted by [`PROGRESS_TEMPLATE`]
const PROGRESS_PREFIX: &str = "progress|";

/// Value for `--progress-template`
pub const PROGRESS_TEMPLATE: &str =
    "download:progress|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s";

static DESTINATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+Destination:\s+(.+)$").expect("valid regex"));
static ALREADY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+(.+) has already been downloaded").expect("valid regex"));
static MERGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\[Merger\]\s+Merging formats into "(.+)"$"#).expect("valid regex"));
static EXTRACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[ExtractAudio\]\s+Destination:\s+(.+)$").expect("valid regex"));

/// What a single engine line means to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// Relay as-is
    Event(ProgressEvent),
    /// The engine started writing (or skipped) this file
    Output(String),
    /// A post-processing step started writing this file
    Postprocess { path: String, detail: String },
    /// An `ERROR:` line
    Error(String),
    Other,
}

/// Classifies one line of engine output (stdout or stderr).
pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim_end();

    if let Some(rest) = line.trim_start().strip_prefix(PROGRESS_PREFIX) {
        return match parse_progress_fields(rest) {
            Some(event) => EngineLine::Event(event),
            None => EngineLine::Other,
        };
    }

    if let Some(msg) = line.strip_prefix("ERROR:") {
        return EngineLine::Error(format!("ERROR: {}", msg.trim()));
    }

    if let Some(caps) = MERGE_RE.captures(line) {
        return EngineLine::Postprocess {
            path: caps[1].to_owned(),
            detail: "Merging video and audio...".to_owned(),
        };
    }
    if let Some(caps) = EXTRACT_RE.captures(line) {
        return EngineLine::Postprocess {
            path: caps[1].to_owned(),
            detail: "Download finished, converting to MP3...".to_owned(),
        };
    }
    if let Some(caps) = DESTINATION_RE.captures(line) {
        return EngineLine::Output(caps[1].to_owned());
    }
    if let Some(caps) = ALREADY_RE.captures(line) {
        return EngineLine::Output(caps[1].to_owned());
    }

    EngineLine::Other
}

fn parse_progress_fields(rest: &str) -> Option<ProgressEvent> {
    let mut fields = rest.split('|').map(display_field);
    let percent = fields.next()?;
    let rate = fields.next()?;
    let eta = fields.next()?;
    Some(ProgressEvent::Downloading { percent, rate, eta })
}

/// yt-dlp pads these and uses "NA" for unknown values
fn display_field(raw: &str) -> String {
    match raw.trim() {
        "" | "NA" | "Unknown" => "N/A".to_owned(),
        v => v.to_owned(),
    }
}

/// Parses a display percent like `" 42.5%"` into `0.0..=1.0` for the progress bar.
pub fn percent_fraction(percent: &str) -> Option<f32> {
    let number = percent.trim().strip_suffix('%')?;
    let v: f32 = number.trim().parse().ok()?;
    Some((v / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_progress_template_line() {
        let line = "progress|  42.3%|  1.21MiB/s|00:37";
        assert_eq!(
            parse_line(line),
            EngineLine::Event(ProgressEvent::Downloading {
                percent: "42.3%".into(),
                rate: "1.21MiB/s".into(),
                eta: "00:37".into(),
            })
        );
    }

    #[test]
    fn unknown_fields_become_na() {
        let line = "progress|  0.0%|NA|Unknown";
        match parse_line(line) {
            EngineLine::Event(ProgressEvent::Downloading { rate, eta, .. }) => {
                assert_eq!(rate, "N/A");
                assert_eq!(eta, "N/A");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truncated_progress_line_is_ignored() {
        assert_eq!(parse_line("progress|12%"), EngineLine::Other);
    }

    #[test]
    fn recognises_destination_and_skip_lines() {
        assert_eq!(
            parse_line("[download] Destination: /tmp/out/Clip.f137.mp4"),
            EngineLine::Output("/tmp/out/Clip.f137.mp4".into())
        );
        assert_eq!(
            parse_line("[download] /tmp/out/Clip.mp4 has already been downloaded"),
            EngineLine::Output("/tmp/out/Clip.mp4".into())
        );
    }

    #[test]
    fn recognises_postprocessing_lines() {
        assert_eq!(
            parse_line(r#"[Merger] Merging formats into "/tmp/out/Clip.mp4""#),
            EngineLine::Postprocess {
                path: "/tmp/out/Clip.mp4".into(),
                detail: "Merging video and audio...".into(),
            }
        );
        match parse_line("[ExtractAudio] Destination: /tmp/out/Clip.mp3") {
            EngineLine::Postprocess { path, .. } => assert_eq!(path, "/tmp/out/Clip.mp3"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_lines_are_collected() {
        assert_eq!(
            parse_line("ERROR: [youtube] abc: Video unavailable"),
            EngineLine::Error("ERROR: [youtube] abc: Video unavailable".into())
        );
        assert_eq!(parse_line("[youtube] Extracting URL"), EngineLine::Other);
    }

    #[test]
    fn percent_fraction_parses_display_strings() {
        assert_eq!(percent_fraction(" 50.0%"), Some(0.5));
        assert_eq!(percent_fraction("100%"), Some(1.0));
        assert_eq!(percent_fraction("N/A"), None);
    }
}
