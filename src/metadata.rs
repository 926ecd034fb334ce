//! Metadata fetcher: asks yt-dlp to describe a URL without downloading it.

use std::collections::BTreeSet;
use std::io::ErrorKind;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::model::VideoMetadata;
use crate::ytdlp::{YtDlp, metadata_args};

/// Subset of yt-dlp's `--dump-json` output that we show
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    height: Option<u32>,
}

impl VideoMetadata {
    /// Builds metadata from one `--dump-json` document.
    pub fn from_info_json(json: &str) -> Result<Self, ExtractionError> {
        let info: InfoJson =
            serde_json::from_str(json).map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let resolutions: BTreeSet<u32> = info
            .formats
            .iter()
            .filter_map(|f| f.height)
            .filter(|h| *h > 0)
            .collect();

        Ok(Self {
            title: info.title.unwrap_or_else(|| "Unknown".to_owned()),
            uploader: info.uploader.unwrap_or_else(|| "Unknown".to_owned()),
            duration_secs: info.duration.filter(|d| d.is_finite() && *d > 0.0).map(|d| d as u64),
            view_count: info.view_count,
            upload_date: info.upload_date.filter(|d| !d.is_empty()),
            resolutions,
            thumbnail_url: info.thumbnail.filter(|t| !t.is_empty()),
        })
    }

    /// Label/value rows for the info panel
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Title", self.title.clone()),
            ("Channel", self.uploader.clone()),
            ("Duration", format_duration(self.duration_secs)),
            ("Views", self.view_count.map(format_count).unwrap_or_else(|| "Unknown".to_owned())),
        ];
        if let Some(date) = &self.upload_date {
            rows.push(("Upload Date", format_upload_date(date)));
        }
        if !self.resolutions.is_empty() {
            rows.push(("Available Qualities", format_resolutions(&self.resolutions)));
        }
        rows
    }
}

/// Runs the engine and parses its description of `url`.
pub async fn fetch(engine: &YtDlp, url: &str) -> Result<VideoMetadata, ExtractionError> {
    info!(url, "fetching metadata");
    let output = engine
        .command(metadata_args(url))
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractionError::EngineMissing,
            _ => ExtractionError::Io(e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .filter(|l| l.starts_with("ERROR:"))
            .collect::<Vec<_>>()
            .join("\n");
        let message = if message.is_empty() {
            format!("yt-dlp exited with {}", output.status)
        } else {
            message
        };
        warn!(url, %message, "metadata fetch failed");
        return Err(ExtractionError::Engine(message));
    }

    // One JSON document per line; --no-playlist leaves exactly one
    let stdout = String::from_utf8_lossy(&output.stdout);
    let doc = stdout
        .lines()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| ExtractionError::Parse("engine printed no JSON".to_owned()))?;
    let meta = VideoMetadata::from_info_json(doc)?;
    debug!(title = %meta.title, resolutions = meta.resolutions.len(), "metadata parsed");
    Ok(meta)
}

/// `HH:MM:SS`, or `MM:SS` under an hour. Zero or missing is "Unknown".
pub fn format_duration(secs: Option<u64>) -> String {
    let secs = match secs {
        Some(s) if s > 0 => s,
        _ => return "Unknown".to_owned(),
    };
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// `YYYYMMDD` → `DD/MM/YYYY`; anything else is returned as-is.
pub fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}/{}/{}", &raw[6..8], &raw[4..6], &raw[0..4])
    } else {
        raw.to_owned()
    }
}

/// Highest first: `1080p, 720p, 480p`
pub fn format_resolutions(heights: &BTreeSet<u32>) -> String {
    heights
        .iter()
        .rev()
        .map(|h| format!("{h}p"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Thousands separators: `1234567` → `1,234,567`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(Some(3600)), "01:00:00");
        assert_eq!(format_duration(Some(3725)), "01:02:05");
        assert_eq!(format_duration(Some(3599)), "59:59");
        assert_eq!(format_duration(Some(65)), "01:05");
        assert_eq!(format_duration(Some(0)), "Unknown");
        assert_eq!(format_duration(None), "Unknown");
    }

    #[test]
    fn duration_shape_by_range() {
        for d in [1u64, 59, 60, 1234, 3599] {
            let s = format_duration(Some(d));
            assert_eq!(s.len(), 5, "{s}");
            assert_eq!(s.matches(':').count(), 1);
        }
        for d in [3600u64, 7322, 86_399] {
            let s = format_duration(Some(d));
            assert_eq!(s.len(), 8, "{s}");
            assert_eq!(s.matches(':').count(), 2);
        }
    }

    #[test]
    fn resolutions_sort_descending() {
        let set: BTreeSet<u32> = [720, 144, 1080, 480].into_iter().collect();
        assert_eq!(format_resolutions(&set), "1080p, 720p, 480p, 144p");
    }

    #[test]
    fn upload_date_reformats() {
        assert_eq!(format_upload_date("20230115"), "15/01/2023");
        assert_eq!(format_upload_date("2023-01-15"), "2023-01-15");
    }

    #[test]
    fn counts_get_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn parses_dump_json() {
        let json = r#"{
            "title": "A Clip",
            "uploader": "Someone",
            "duration": 212.0,
            "view_count": 1500,
            "upload_date": "20230115",
            "thumbnail": "https://i.example.com/t.jpg",
            "formats": [
                {"format_id": "140", "height": null},
                {"format_id": "160", "height": 144},
                {"format_id": "137", "height": 1080},
                {"format_id": "136", "height": 720},
                {"format_id": "22", "height": 720}
            ]
        }"#;
        let meta = VideoMetadata::from_info_json(json).expect("valid json");
        assert_eq!(meta.title, "A Clip");
        assert_eq!(meta.duration_secs, Some(212));
        assert_eq!(meta.resolutions.iter().copied().collect::<Vec<_>>(), vec![144, 720, 1080]);
        assert_eq!(meta.thumbnail_url.as_deref(), Some("https://i.example.com/t.jpg"));

        let rows = meta.summary();
        assert!(rows.contains(&("Duration", "03:32".to_owned())));
        assert!(rows.contains(&("Views", "1,500".to_owned())));
        assert!(rows.contains(&("Upload Date", "15/01/2023".to_owned())));
        assert!(rows.contains(&("Available Qualities", "1080p, 720p, 144p".to_owned())));
    }

    #[test]
    fn missing_fields_fall_back() {
        let meta = VideoMetadata::from_info_json("{}").expect("valid json");
        assert_eq!(meta.title, "Unknown");
        assert!(meta.resolutions.is_empty());
        let rows = meta.summary();
        assert!(rows.contains(&("Duration", "Unknown".to_owned())));
        assert!(rows.contains(&("Views", "Unknown".to_owned())));
        assert!(!rows.iter().any(|(k, _)| *k == "Upload Date"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            VideoMetadata::from_info_json("not json"),
            Err(ExtractionError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_engine_is_reported() {
        let engine = YtDlp::new("/definitely/not/here/yt-dlp");
        let err = fetch(&engine, "https://example.com/v").await.unwrap_err();
        assert!(matches!(err, ExtractionError::EngineMissing));
    }
}
