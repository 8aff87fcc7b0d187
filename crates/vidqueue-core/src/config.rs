//! Application configuration management.
//!
//! Handles loading and saving user preferences: queue column visibility, the
//! concurrent-download limit, the last-used format selection, and the theme.
//! The file lives under the platform config directory and is written on every
//! change; a missing or corrupt file falls back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Sentinel for "no limit" on concurrent downloads.
pub const UNLIMITED_DOWNLOADS: i32 = -1;

/// Theme setting for the application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark theme.
    Dark,
    /// Light theme.
    Light,
    /// Follow system preference (default).
    #[default]
    System,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dark => write!(f, "Dark"),
            Self::Light => write!(f, "Light"),
            Self::System => write!(f, "System"),
        }
    }
}

/// Visibility of the optional queue columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnVisibility {
    /// Show the format-id column.
    #[serde(default)]
    pub format: bool,
    /// Show the format-note column.
    #[serde(default)]
    pub format_note: bool,
    /// Show the extension column.
    #[serde(default)]
    pub ext: bool,
    /// Show the filesize column.
    #[serde(default)]
    pub filesize: bool,
    /// Show the site favicon in the website column.
    #[serde(default = "default_true")]
    pub site_icon: bool,
    /// Show the site name text in the website column.
    #[serde(default)]
    pub site_text: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ColumnVisibility {
    fn default() -> Self {
        Self {
            format: false,
            format_note: false,
            ext: false,
            filesize: false,
            site_icon: true,
            site_text: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Maximum number of concurrently downloading items; `-1` means unlimited.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: i32,
    /// Queue column visibility.
    #[serde(default)]
    pub columns: ColumnVisibility,
    /// Last manually selected primary format id.
    #[serde(default)]
    pub fmt1: String,
    /// Last manually selected secondary format id.
    #[serde(default)]
    pub fmt2: String,
    /// Allow merging multiple audio formats into one file.
    #[serde(default)]
    pub audio_multistreams: bool,
    /// Use one shared options panel for all queue items.
    #[serde(default = "default_true")]
    pub common_dl_options: bool,
    /// Whether the custom command-line arguments are applied.
    #[serde(default)]
    pub use_custom_args: bool,
    /// Custom command-line arguments passed through to the downloader.
    #[serde(default)]
    pub custom_args: String,
    /// Theme preference.
    #[serde(default)]
    pub theme: Theme,
    /// Directory downloads are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

const fn default_max_concurrent() -> i32 {
    1
}

fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
            columns: ColumnVisibility::default(),
            fmt1: String::new(),
            fmt2: String::new(),
            audio_multistreams: false,
            common_dl_options: true,
            use_custom_args: false,
            custom_args: String::new(),
            theme: Theme::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Default location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("vidqueue").join("settings.json"))
            .ok_or_else(|| {
                Error::Configuration("Could not determine config directory".to_string())
            })
    }

    /// Load the configuration from the given path.
    ///
    /// A missing file yields the defaults; a corrupt file is logged and also
    /// falls back to defaults rather than failing startup.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "Configuration at {} is invalid ({}), using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!(
                    "Could not read configuration at {} ({}), using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the configuration to the given path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Whether the download limit is unlimited (`-1` or any negative value).
    #[must_use]
    pub const fn unlimited_downloads(&self) -> bool {
        self.max_concurrent_downloads <= UNLIMITED_DOWNLOADS
    }

    /// The concurrency limit as an optional count (`None` = unlimited).
    ///
    /// A zero from a hand-edited file is clamped to 1; only the negative
    /// sentinel lifts the cap.
    #[must_use]
    pub fn download_limit(&self) -> Option<usize> {
        if self.unlimited_downloads() {
            None
        } else if self.max_concurrent_downloads == 0 {
            Some(1)
        } else {
            Some(self.max_concurrent_downloads as usize)
        }
    }
}
