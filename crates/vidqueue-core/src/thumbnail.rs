//! Thumbnail retrieval.
//!
//! A blocking HTTP fetch returning raw image bytes. Failures never affect
//! the owning item's status; they only turn into a placeholder message for
//! the preview surface.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default timeout for thumbnail fetch requests.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetch thumbnail bytes from a URL.
///
/// # Errors
///
/// Returns an error if the request fails or the body is empty.
pub fn fetch_thumbnail(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    debug!("Fetching thumbnail from {}", url);
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Thumbnail(format!("could not create HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::Thumbnail(format!("could not fetch thumbnail: {e}")))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("image/") {
        warn!("Unexpected content type for thumbnail: {}", content_type);
    }

    let data = response
        .bytes()
        .map_err(|e| Error::Thumbnail(format!("could not read thumbnail data: {e}")))?;

    if data.is_empty() {
        return Err(Error::Thumbnail("empty thumbnail data".to_string()));
    }
    Ok(data.to_vec())
}

/// Recognize the image container from its magic bytes.
#[must_use]
pub fn image_kind(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.starts_with(b"BM") {
        Some("bmp")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Placeholder message for bytes that are not a displayable image.
///
/// Includes the file extension scraped from the URL when one is present.
#[must_use]
pub fn unsupported_format_message(url: &str) -> String {
    let ext = url.rsplit('/').next().and_then(|name| {
        let (_, ext) = name.rsplit_once('.')?;
        let ext: String = ext.chars().take_while(char::is_ascii_alphabetic).collect();
        (!ext.is_empty()).then_some(ext)
    });
    match ext {
        Some(ext) => format!("thumbnail format unsupported (.{ext})"),
        None => "thumbnail format unsupported".to_string(),
    }
}
