//! Per-item background workers.
//!
//! Each queue item may own up to three concurrently running workers, one per
//! [`WorkerKind`]: metadata fetch, media download, thumbnail fetch. A worker
//! is an OS thread holding a clone of its [`CancelToken`]; stopping is always
//! cooperative (the flag is raised, the worker notices at its next poll point
//! and returns) and joining is always preceded by the signal. Workers never
//! touch queue state directly; they post [`WorkerEvent`]s through a channel
//! that the owning thread drains.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Cooperative cancellation token shared between a worker and its owner.
///
/// The flag is read by the worker at poll points without any lock; the race
/// with the writer is benign, cancellation only has to be observed
/// eventually.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the worker to stop at its next poll point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The three worker kinds a queue item may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    /// Metadata fetch through the external tool.
    Info,
    /// Media download through the external tool.
    Download,
    /// Thumbnail retrieval over HTTP.
    Thumbnail,
}

impl WorkerKind {
    const fn slot(self) -> usize {
        match self {
            Self::Info => 0,
            Self::Download => 1,
            Self::Thumbnail => 2,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Download => "download",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// Events a worker posts back to the owning thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Metadata arrived for the item.
    InfoFetched {
        /// Item URL.
        url: String,
        /// The raw metadata blob.
        info: serde_json::Value,
    },
    /// Metadata fetch failed.
    InfoFailed {
        /// Item URL.
        url: String,
        /// Failure reason for the status column.
        reason: String,
    },
    /// A progress line arrived from the download.
    DownloadProgress {
        /// Item URL.
        url: String,
        /// Percent complete, when the line carried one.
        percent: Option<f32>,
        /// The raw output line.
        line: String,
    },
    /// The download finished successfully.
    DownloadFinished {
        /// Item URL.
        url: String,
    },
    /// The download observed its cancel token and stopped.
    DownloadStopped {
        /// Item URL.
        url: String,
    },
    /// The download failed.
    DownloadFailed {
        /// Item URL.
        url: String,
        /// Failure reason for the status column.
        reason: String,
    },
    /// Thumbnail bytes arrived.
    ThumbnailReady {
        /// Item URL.
        url: String,
        /// Raw image bytes.
        bytes: Vec<u8>,
    },
    /// Thumbnail retrieval failed; the item status is unaffected.
    ThumbnailFailed {
        /// Item URL.
        url: String,
        /// Placeholder message for the preview surface.
        message: String,
    },
}

impl WorkerEvent {
    /// URL of the item this event belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::InfoFetched { url, .. }
            | Self::InfoFailed { url, .. }
            | Self::DownloadProgress { url, .. }
            | Self::DownloadFinished { url }
            | Self::DownloadStopped { url }
            | Self::DownloadFailed { url, .. }
            | Self::ThumbnailReady { url, .. }
            | Self::ThumbnailFailed { url, .. } => url,
        }
    }
}

/// Sender half of the worker event channel.
pub type EventSender = mpsc::UnboundedSender<WorkerEvent>;

/// Receiver half of the worker event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<WorkerEvent>;

/// Handle to one live worker: its token plus the join handle.
#[derive(Debug)]
struct WorkerHandle {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// The workers owned by a single queue item, at most one live per kind.
#[derive(Debug, Default)]
pub struct WorkerSet {
    slots: [Option<WorkerHandle>; 3],
}

impl WorkerSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a worker of the given kind is currently alive.
    #[must_use]
    pub fn is_running(&self, kind: WorkerKind) -> bool {
        self.slots[kind.slot()]
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Whether any worker of any kind is currently alive.
    #[must_use]
    pub fn any_running(&self) -> bool {
        [WorkerKind::Info, WorkerKind::Download, WorkerKind::Thumbnail]
            .into_iter()
            .any(|k| self.is_running(k))
    }

    /// Spawn a worker of the given kind, unless one is already running.
    ///
    /// Returns `true` when a thread was spawned. A finished handle left over
    /// from a previous run of the same kind is joined and replaced.
    pub fn spawn<F>(&mut self, kind: WorkerKind, url: &str, body: F) -> bool
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        if self.is_running(kind) {
            debug!("{} worker already running for {}", kind.name(), url);
            return false;
        }
        // Reap a finished previous worker of this kind before restarting.
        self.join(kind);

        let token = CancelToken::new();
        let worker_token = token.clone();
        let builder =
            std::thread::Builder::new().name(format!("vidqueue-{}", kind.name()));
        match builder.spawn(move || body(worker_token)) {
            Ok(handle) => {
                debug!("Spawned {} worker for {}", kind.name(), url);
                self.slots[kind.slot()] = Some(WorkerHandle { token, handle });
                true
            }
            Err(e) => {
                warn!("Could not spawn {} worker for {}: {}", kind.name(), url, e);
                false
            }
        }
    }

    /// Signal the worker of the given kind to stop, without joining.
    pub fn signal(&self, kind: WorkerKind) {
        if let Some(w) = &self.slots[kind.slot()] {
            w.token.cancel();
        }
    }

    /// Signal every live worker to stop, without joining any of them.
    ///
    /// Removal paths call this first so that no join waits on a worker that
    /// has not yet been told to stop.
    pub fn signal_all(&self) {
        for slot in &self.slots {
            if let Some(w) = slot {
                w.token.cancel();
            }
        }
    }

    /// Join the worker of the given kind, if any. The caller must have
    /// signalled it first for the wait to be short.
    pub fn join(&mut self, kind: WorkerKind) {
        if let Some(w) = self.slots[kind.slot()].take() {
            if w.handle.join().is_err() {
                warn!("{} worker panicked", kind.name());
            }
        }
    }

    /// Signal then join the worker of the given kind.
    pub fn stop_and_join(&mut self, kind: WorkerKind) {
        self.signal(kind);
        self.join(kind);
    }

    /// Signal every worker, then join them all.
    pub fn stop_and_join_all(&mut self) {
        self.signal_all();
        for kind in [WorkerKind::Info, WorkerKind::Download, WorkerKind::Thumbnail] {
            self.join(kind);
        }
    }

    /// Drop the handle of a worker that reported completion through the
    /// event channel. The join is immediate since the thread has returned.
    pub fn reap(&mut self, kind: WorkerKind) {
        if self.slots[kind.slot()]
            .as_ref()
            .is_some_and(|w| w.handle.is_finished())
        {
            self.join(kind);
        }
    }
}
