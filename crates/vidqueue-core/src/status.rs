//! Per-row status state machine.
//!
//! Every queue item carries a [`DownloadStatus`]. Transitions:
//!
//! ```text
//! queued -> fetching-info -> (ready | error) -> downloading -> (done | stopped | error)
//! stopped -> downloading (resume)
//! error -> downloading (restart by the user, not by the scheduler)
//! ```
//!
//! `done` and `error` are terminal for the scheduler; `stopped` is resumable
//! and competes for autostart like `queued`. The context-menu contents are
//! derived from the status alone, so what the UI offers for a row is a pure
//! function of this enum.

use serde::{Deserialize, Serialize};

/// Status of a queue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Item is waiting, no worker has touched it yet.
    #[default]
    Queued,
    /// Metadata is being fetched by the info worker.
    FetchingInfo,
    /// Metadata arrived, the item is ready to download.
    Ready,
    /// The download worker is running.
    Downloading,
    /// Download completed successfully.
    Done,
    /// Download was stopped by the user; resumable.
    Stopped,
    /// Metadata fetch or download failed.
    Error(String),
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::FetchingInfo => write!(f, "fetching info"),
            Self::Ready => write!(f, "ready"),
            Self::Downloading => write!(f, "downloading"),
            Self::Done => write!(f, "done"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

impl DownloadStatus {
    /// Whether the scheduler may auto-start this item.
    ///
    /// Errored items are excluded here: restarting after a failure is a user
    /// decision, not something the autostart loop retries on its own.
    #[must_use]
    pub const fn is_autostartable(&self) -> bool {
        matches!(self, Self::Queued | Self::Ready | Self::Stopped)
    }

    /// Whether the user may start (or restart) this item.
    #[must_use]
    pub const fn is_startable(&self) -> bool {
        matches!(
            self,
            Self::Queued | Self::Ready | Self::Stopped | Self::Error(_)
        )
    }

    /// Whether a worker is currently running for this item.
    #[must_use]
    pub const fn is_stoppable(&self) -> bool {
        matches!(self, Self::FetchingInfo | Self::Downloading)
    }

    /// Whether the item reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub fn can_transition(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Queued, Self::FetchingInfo | Self::Downloading)
            | (Self::FetchingInfo, Self::Ready | Self::Error(_) | Self::Queued)
            | (Self::Ready, Self::Downloading)
            | (Self::Downloading, Self::Done | Self::Stopped | Self::Error(_))
            | (Self::Stopped | Self::Error(_), Self::Downloading) => true,
            _ => false,
        }
    }
}

/// A single-item action offered in the row's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Start the download.
    Download,
    /// Resume a stopped download.
    Resume,
    /// Retry after an error.
    Retry,
    /// Stop the running worker.
    Stop,
    /// Remove the item from the queue.
    Remove,
    /// Open the manual format selection dialog.
    SelectFormats,
}

impl RowAction {
    /// Menu label for this action.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Download => "Download",
            Self::Resume => "Resume",
            Self::Retry => "Retry",
            Self::Stop => "Stop",
            Self::Remove => "Remove",
            Self::SelectFormats => "Select formats",
        }
    }
}

/// The start/stop verb appropriate for a row, derived from its status.
#[must_use]
pub const fn primary_action(status: &DownloadStatus) -> RowAction {
    match status {
        DownloadStatus::Stopped => RowAction::Resume,
        DownloadStatus::Error(_) => RowAction::Retry,
        DownloadStatus::FetchingInfo | DownloadStatus::Downloading => RowAction::Stop,
        DownloadStatus::Queued | DownloadStatus::Ready | DownloadStatus::Done => {
            RowAction::Download
        }
    }
}

/// Context-menu actions valid for a row in the given state.
///
/// Format selection requires fetched metadata, which the caller knows and the
/// status does not, hence the `has_info` flag.
#[must_use]
pub fn row_actions(status: &DownloadStatus, has_info: bool) -> Vec<RowAction> {
    let mut actions = Vec::with_capacity(3);
    if !matches!(status, DownloadStatus::Done) {
        actions.push(primary_action(status));
    }
    actions.push(RowAction::Remove);
    if has_info && !status.is_terminal() {
        actions.push(RowAction::SelectFormats);
    }
    actions
}
