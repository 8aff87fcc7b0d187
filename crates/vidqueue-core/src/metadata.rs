//! Fetched media metadata.
//!
//! The info worker asks the external tool to dump a JSON description of the
//! URL. This module reduces that blob to what the queue and the format picker
//! display: title, source site, duration, chapter count, uploader, upload
//! date, a preferred thumbnail URL, and the list of available formats.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::{MISSING, MediaFormat};

/// Title shown when the tool reports none.
pub const TITLE_MISSING: &str = "[title missing]";

/// Parsed metadata for one queue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Media title.
    pub title: String,
    /// Source site name.
    pub site: String,
    /// Duration display text ("4:20", "1:02:03", "live", or "---").
    pub duration_text: String,
    /// Chapter count display text ("none" or a number).
    pub chapters_text: String,
    /// Uploader display text.
    pub uploader: String,
    /// Upload date as "YYYY-MM-DD", or "---".
    pub upload_date: String,
    /// Preferred thumbnail URL, when one exists.
    pub thumbnail_url: Option<String>,
    /// Whether this is a live stream.
    pub is_live: bool,
    /// The format the tool would pick automatically, when reported.
    pub auto_format_id: Option<String>,
    /// All downloadable formats.
    pub formats: Vec<MediaFormat>,
}

impl MediaInfo {
    /// Reduce a metadata blob to display fields.
    #[must_use]
    pub fn from_json(j: &Value) -> Self {
        let is_live = j.get("is_live").and_then(Value::as_bool).unwrap_or(false)
            || j.get("live_status").and_then(Value::as_str) == Some("is_live");

        let duration_text = if is_live {
            "live".to_string()
        } else {
            match j.get("duration").and_then(Value::as_u64) {
                Some(secs) if secs > 0 => format_duration(secs),
                _ => j
                    .get("duration_string")
                    .and_then(Value::as_str)
                    .unwrap_or(MISSING)
                    .to_string(),
            }
        };

        let chapters = j
            .get("chapters")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let chapters_text = if chapters == 0 {
            "none".to_string()
        } else {
            chapters.to_string()
        };

        let upload_date = j
            .get("upload_date")
            .and_then(Value::as_str)
            .map_or_else(|| MISSING.to_string(), format_upload_date);

        let formats = j
            .get("formats")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(MediaFormat::from_json).collect())
            .unwrap_or_default();

        Self {
            title: j
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(TITLE_MISSING)
                .to_string(),
            site: j
                .get("extractor_key")
                .or_else(|| j.get("extractor"))
                .and_then(Value::as_str)
                .unwrap_or(MISSING)
                .to_string(),
            duration_text,
            chapters_text,
            uploader: j
                .get("uploader")
                .and_then(Value::as_str)
                .unwrap_or(MISSING)
                .to_string(),
            upload_date,
            thumbnail_url: pick_thumbnail(j),
            is_live,
            auto_format_id: j
                .get("format_id")
                .and_then(Value::as_str)
                .map(String::from),
            formats,
        }
    }

    /// The tool's automatic choice split into primary/secondary ids.
    #[must_use]
    pub fn auto_format_ids(&self) -> (Option<String>, Option<String>) {
        match &self.auto_format_id {
            Some(id) => match id.split_once('+') {
                Some((a, b)) => (Some(a.to_string()), Some(b.to_string())),
                None => (Some(id.clone()), None),
            },
            None => (None, None),
        }
    }
}

/// Pick the thumbnail URL for display.
///
/// Prefers the medium-quality variant from the thumbnails array (it is small
/// enough to fetch quickly), falling back to the live variant and then to the
/// top-level `thumbnail` field.
fn pick_thumbnail(j: &Value) -> Option<String> {
    if let Some(thumbs) = j.get("thumbnails").and_then(Value::as_array) {
        for suffix in ["mqdefault.jpg", "mqdefault_live.jpg"] {
            let found = thumbs.iter().find_map(|t| {
                t.get("url")
                    .and_then(Value::as_str)
                    .filter(|u| u.ends_with(suffix))
            });
            if let Some(url) = found {
                return Some(url.to_string());
            }
        }
    }
    j.get("thumbnail")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Format a duration in seconds as "m:ss" or "h:mm:ss".
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let hr = secs / 3600;
    let min = (secs / 60) % 60;
    let sec = secs % 60;
    if hr > 0 {
        format!("{hr}:{min:02}:{sec:02}")
    } else {
        format!("{min}:{sec:02}")
    }
}

/// Reformat the tool's "YYYYMMDD" upload date as "YYYY-MM-DD".
#[must_use]
pub fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_string()
    }
}

/// Human-readable filesize, e.g. "3.5 MB".
#[must_use]
pub fn format_filesize(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
