//! Media format records and manual format selection.
//!
//! The downloader reports every available format for a URL in its metadata
//! blob. The format-picker dialog presents them grouped into combined,
//! audio-only and video-only categories, and returns up to two format ids:
//! a primary stream and an optional secondary stream to merge into it. The
//! combined selection string is what gets passed to the tool's `-f` option.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for fields the tool did not report.
pub const MISSING: &str = "---";

/// Secondary-selection sentinel meaning "merge every audio format".
pub const MERGE_ALL: &str = "mergeall";

/// Category a format row belongs to in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCategory {
    /// Muxed audio+video stream.
    Combined,
    /// Audio-only stream.
    AudioOnly,
    /// Video-only stream.
    VideoOnly,
}

impl std::fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Combined => write!(f, "Combined"),
            Self::AudioOnly => write!(f, "Audio only"),
            Self::VideoOnly => write!(f, "Video only"),
        }
    }
}

/// One format row as reported by the downloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    /// Human-readable format description.
    pub format: String,
    /// Format id, the token passed to `-f`.
    pub format_id: String,
    /// Audio codec, or "none" for video-only streams.
    pub acodec: String,
    /// Video codec, or "none" for audio-only streams.
    pub vcodec: String,
    /// Container extension.
    pub ext: String,
    /// Frames per second.
    pub fps: String,
    /// Video bitrate.
    pub vbr: String,
    /// Audio bitrate.
    pub abr: String,
    /// Audio sample rate.
    pub asr: String,
    /// Resolution, for the format-note column of video rows.
    pub resolution: String,
    /// Format note, for the format-note column of audio rows.
    pub format_note: String,
    /// Exact filesize in bytes, when the tool reports one.
    pub filesize: Option<u64>,
    /// Estimated filesize in bytes, reported when the exact size is unknown.
    pub filesize_approx: Option<u64>,
}

fn get_string(j: &Value, key: &str) -> String {
    match j.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => MISSING.to_string(),
    }
}

fn get_int(j: &Value, key: &str) -> String {
    match j.get(key) {
        Some(v) if v.is_number() => v
            .as_f64()
            .map_or_else(|| MISSING.to_string(), |n| format!("{}", n.round() as u64)),
        _ => MISSING.to_string(),
    }
}

impl MediaFormat {
    /// Parse one entry of the metadata blob's `formats` array.
    ///
    /// Returns `None` for storyboard pseudo-formats, which are never
    /// downloadable media.
    #[must_use]
    pub fn from_json(j: &Value) -> Option<Self> {
        let format = get_string(j, "format");
        if format.contains("storyboard") {
            return None;
        }
        Some(Self {
            format,
            format_id: get_string(j, "format_id"),
            acodec: get_string(j, "acodec"),
            vcodec: get_string(j, "vcodec"),
            ext: get_string(j, "ext"),
            fps: get_int(j, "fps"),
            vbr: get_int(j, "vbr"),
            abr: get_int(j, "abr"),
            asr: get_int(j, "asr"),
            resolution: get_string(j, "resolution"),
            format_note: get_string(j, "format_note"),
            filesize: j.get("filesize").and_then(Value::as_u64),
            filesize_approx: j.get("filesize_approx").and_then(Value::as_u64),
        })
    }

    /// The filesize to display: the exact size when known, otherwise the
    /// estimate. The flag is `true` for an estimate ("~" prefix in the UI).
    #[must_use]
    pub const fn display_size(&self) -> Option<(u64, bool)> {
        match (self.filesize, self.filesize_approx) {
            (Some(n), _) => Some((n, false)),
            (None, Some(n)) => Some((n, true)),
            (None, None) => None,
        }
    }

    /// Which picker category this format belongs to.
    #[must_use]
    pub fn category(&self) -> FormatCategory {
        if self.acodec == "none" {
            FormatCategory::VideoOnly
        } else if self.vcodec == "none" {
            FormatCategory::AudioOnly
        } else {
            FormatCategory::Combined
        }
    }

    /// The format-note column text: resolution for video, note for audio.
    #[must_use]
    pub fn note(&self) -> &str {
        match self.category() {
            FormatCategory::AudioOnly => &self.format_note,
            _ => &self.resolution,
        }
    }
}

/// Result of the format-picker dialog: up to two format-id strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSelection {
    /// Primary stream id (video or combined).
    pub primary: Option<String>,
    /// Secondary stream id merged into the primary (audio), or [`MERGE_ALL`].
    pub secondary: Option<String>,
}

impl FormatSelection {
    /// Build a selection from explicit ids, dropping empty strings.
    #[must_use]
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        let primary: String = primary.into();
        let secondary: String = secondary.into();
        Self {
            primary: (!primary.is_empty()).then_some(primary),
            secondary: (!secondary.is_empty()).then_some(secondary),
        }
    }

    /// The combined `-f` string: `"137+140"`, `"137"`, `"140"`, or `None`
    /// when nothing was selected.
    #[must_use]
    pub fn combined(&self) -> Option<String> {
        match (&self.primary, &self.secondary) {
            (Some(p), Some(s)) => Some(format!("{p}+{s}")),
            (Some(p), None) => Some(p.clone()),
            (None, Some(s)) => Some(s.clone()),
            (None, None) => None,
        }
    }

    /// Whether the user picked anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

/// Assemble a [`FormatSelection`] from the checked picker rows.
///
/// The video-only or combined row becomes the primary stream; audio-only rows
/// become the secondary. In multistream mode several audio rows may be
/// checked and are joined with `+`; when every audio-only row of the list is
/// checked the secondary collapses to [`MERGE_ALL`].
#[must_use]
pub fn selection_from_checked(
    all: &[MediaFormat],
    checked_ids: &[&str],
    multistream: bool,
) -> FormatSelection {
    let audio_total = all
        .iter()
        .filter(|f| f.category() == FormatCategory::AudioOnly)
        .count();

    let mut primary = None;
    let mut audio: Vec<&str> = Vec::new();
    for fmt in all {
        if !checked_ids.contains(&fmt.format_id.as_str()) {
            continue;
        }
        match fmt.category() {
            FormatCategory::AudioOnly => audio.push(&fmt.format_id),
            FormatCategory::Combined | FormatCategory::VideoOnly => {
                primary = Some(fmt.format_id.clone());
            }
        }
    }

    let secondary = if multistream && audio_total > 0 && audio.len() == audio_total {
        Some(MERGE_ALL.to_string())
    } else if audio.is_empty() {
        None
    } else {
        Some(audio.join("+"))
    };

    FormatSelection { primary, secondary }
}

/// Whether a custom argument string already pins a format with `-f`.
///
/// A manual selection made while this is true still gets recorded, but the
/// custom argument wins at execution time; the caller should surface a
/// non-blocking warning.
#[must_use]
pub fn custom_args_pin_format(custom_args: &str) -> bool {
    custom_args
        .split_whitespace()
        .any(|tok| tok == "-f" || tok == "--format" || tok.starts_with("--format="))
}

/// Number of columns in the format-picker list.
pub const PICKER_COLUMNS: usize = 9;

/// Which picker columns carry any real data across the given formats.
///
/// The format column is always visible; a detail column is hidden when every
/// row shows a placeholder or "none" in it.
#[must_use]
pub fn column_mask(formats: &[MediaFormat]) -> [bool; PICKER_COLUMNS] {
    let mut mask = [false; PICKER_COLUMNS];
    mask[0] = true;
    for f in formats {
        let fsize = f
            .filesize
            .map_or_else(|| MISSING.to_string(), |n| n.to_string());
        let cells = [
            &f.acodec, &f.vcodec, &f.ext, &f.fps, &f.vbr, &f.abr, &f.asr, &fsize,
        ];
        for (n, cell) in cells.iter().enumerate() {
            if !mask[n + 1] && cell.as_str() != MISSING && cell.as_str() != "none" {
                mask[n + 1] = true;
            }
        }
    }
    mask
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fmt(id: &str, acodec: &str, vcodec: &str) -> MediaFormat {
        MediaFormat {
            format: format!("{id} - test"),
            format_id: id.to_string(),
            acodec: acodec.to_string(),
            vcodec: vcodec.to_string(),
            ext: "mp4".to_string(),
            fps: MISSING.to_string(),
            vbr: MISSING.to_string(),
            abr: MISSING.to_string(),
            asr: MISSING.to_string(),
            resolution: "1920x1080".to_string(),
            format_note: "medium".to_string(),
            filesize: None,
            filesize_approx: None,
        }
    }

    #[test]
    fn test_combined_both_streams() {
        let sel = FormatSelection::new("137", "140");
        assert_eq!(sel.combined(), Some("137+140".to_string()));
    }

    #[test]
    fn test_combined_primary_only() {
        let sel = FormatSelection::new("137", "");
        assert_eq!(sel.combined(), Some("137".to_string()));
    }

    #[test]
    fn test_combined_secondary_only() {
        let sel = FormatSelection::new("", "140");
        assert_eq!(sel.combined(), Some("140".to_string()));
    }

    #[test]
    fn test_combined_empty() {
        assert_eq!(FormatSelection::default().combined(), None);
        assert!(FormatSelection::new("", "").is_empty());
    }

    #[test]
    fn test_categories() {
        assert_eq!(fmt("18", "mp4a", "avc1").category(), FormatCategory::Combined);
        assert_eq!(fmt("140", "mp4a", "none").category(), FormatCategory::AudioOnly);
        assert_eq!(fmt("137", "none", "avc1").category(), FormatCategory::VideoOnly);
    }

    #[test]
    fn test_from_json_skips_storyboards() {
        let j = json!({"format": "sb0 - storyboard", "format_id": "sb0"});
        assert!(MediaFormat::from_json(&j).is_none());
    }

    #[test]
    fn test_from_json_missing_fields_become_placeholders() {
        let j = json!({"format": "137 - 1080p", "format_id": "137", "vcodec": "avc1"});
        let f = MediaFormat::from_json(&j).unwrap();
        assert_eq!(f.acodec, MISSING);
        assert_eq!(f.fps, MISSING);
        assert_eq!(f.filesize, None);
    }

    #[test]
    fn test_display_size_prefers_exact_over_estimate() {
        let mut f = fmt("137", "none", "avc1");
        assert_eq!(f.display_size(), None);
        f.filesize_approx = Some(1000);
        assert_eq!(f.display_size(), Some((1000, true)));
        f.filesize = Some(900);
        assert_eq!(f.display_size(), Some((900, false)));
    }

    #[test]
    fn test_selection_from_checked_video_plus_audio() {
        let all = vec![
            fmt("137", "none", "avc1"),
            fmt("140", "mp4a", "none"),
            fmt("251", "opus", "none"),
        ];
        let sel = selection_from_checked(&all, &["137", "140"], false);
        assert_eq!(sel.combined(), Some("137+140".to_string()));
    }

    #[test]
    fn test_selection_from_checked_mergeall() {
        let all = vec![
            fmt("137", "none", "avc1"),
            fmt("140", "mp4a", "none"),
            fmt("251", "opus", "none"),
        ];
        let sel = selection_from_checked(&all, &["137", "140", "251"], true);
        assert_eq!(sel.secondary.as_deref(), Some(MERGE_ALL));
        assert_eq!(sel.combined(), Some("137+mergeall".to_string()));
    }

    #[test]
    fn test_selection_multistream_partial_joins_with_plus() {
        let all = vec![
            fmt("140", "mp4a", "none"),
            fmt("251", "opus", "none"),
            fmt("250", "opus", "none"),
        ];
        let sel = selection_from_checked(&all, &["140", "251"], true);
        assert_eq!(sel.combined(), Some("140+251".to_string()));
    }

    #[test]
    fn test_custom_args_pin_format() {
        assert!(custom_args_pin_format("-f bestvideo+bestaudio"));
        assert!(custom_args_pin_format("--format 137"));
        assert!(custom_args_pin_format("--format=137 --no-part"));
        assert!(!custom_args_pin_format("--no-part -o out.mp4"));
    }

    #[test]
    fn test_column_mask_hides_empty_columns() {
        let mut a = fmt("140", "mp4a", "none");
        a.ext = "m4a".to_string();
        let mask = column_mask(&[a]);
        assert!(mask[0]); // format, always
        assert!(mask[1]); // acodec
        assert!(!mask[2]); // vcodec is "none" everywhere
        assert!(mask[3]); // ext
        assert!(!mask[4]); // fps missing
    }
}
