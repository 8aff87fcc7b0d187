//! `Vidqueue` Core Library
//!
//! This crate provides the core functionality for the `Vidqueue` application:
//! - The download queue table: ordered rows, selection, drag reorder
//! - Per-item background workers with cooperative cancellation
//! - The autostart scheduler honoring a concurrency limit
//! - Media metadata and format selection
//! - Driving `yt-dlp` as a subprocess
//! - Thumbnail retrieval
//! - Application configuration management
//!
//! All queue mutation happens on the thread that owns the [`QueueEngine`];
//! workers communicate back through an event channel drained on the UI tick.
//!
//! # Error Handling
//!
//! This crate uses typed errors for each domain. See the [`error`] module
//! for details.
//!
//! ```rust,ignore
//! use vidqueue_core::{Error, Result};
//!
//! fn do_something() -> Result<()> {
//!     // Your code here
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod metadata;
pub mod queue;
pub mod status;
pub mod thumbnail;
pub mod tool;
pub mod worker;

pub use config::{ColumnVisibility, Config, Theme, UNLIMITED_DOWNLOADS};
pub use engine::{CUSTOM_ARGS_FORMAT_WARNING, QueueEngine, QueueStats};
pub use error::{Error, Result};
pub use format::{
    FormatCategory, FormatSelection, MERGE_ALL, MISSING, MediaFormat, PICKER_COLUMNS,
    column_mask, custom_args_pin_format, selection_from_checked,
};
pub use metadata::{
    MediaInfo, TITLE_MISSING, format_duration, format_filesize, format_upload_date,
};
pub use queue::{
    AUTOSCROLL_INTERVAL, COL_EXT, COL_FILESIZE, COL_FORMAT, COL_FORMAT_NOTE, COL_SITE,
    COL_STATUS, COL_TITLE, COLUMN_COUNT, Columns, DragOutcome, DragSession, QueueItem,
    QueueTable, RowHighlight, ScrollDirection, SelectMode, ThumbnailPreview,
};
pub use status::{DownloadStatus, RowAction, primary_action, row_actions};
pub use thumbnail::{
    DEFAULT_FETCH_TIMEOUT_SECS, fetch_thumbnail, image_kind, unsupported_format_message,
};
pub use tool::{DownloadRequest, MediaTool, ToolOutcome, YtDlp};
pub use worker::{CancelToken, EventReceiver, EventSender, WorkerEvent, WorkerKind, WorkerSet};
