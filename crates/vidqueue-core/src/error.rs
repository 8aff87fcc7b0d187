//! Error types for Vidqueue core operations.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Vidqueue core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A queue item with the same URL already exists.
    #[error("URL already queued: {0}")]
    DuplicateUrl(String),

    /// No queue item exists for the given URL.
    #[error("No queue item for URL: {0}")]
    NoSuchItem(String),

    /// A drag gesture was attempted in an invalid state.
    #[error("Invalid drag operation: {0}")]
    InvalidDrag(String),

    /// Metadata fetch through the external tool failed.
    #[error("Metadata fetch failed: {0}")]
    InfoFetch(String),

    /// Media download through the external tool failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// Thumbnail retrieval failed.
    #[error("Thumbnail fetch failed: {0}")]
    Thumbnail(String),

    /// The external downloader tool could not be invoked.
    #[error("Downloader tool error: {0}")]
    Tool(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_url_display() {
        let err = Error::DuplicateUrl("https://example.com/v/1".to_string());
        assert_eq!(err.to_string(), "URL already queued: https://example.com/v/1");
    }

    #[test]
    fn test_no_such_item_display() {
        let err = Error::NoSuchItem("https://example.com/v/2".to_string());
        assert!(err.to_string().contains("https://example.com/v/2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
