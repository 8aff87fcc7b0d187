//! The queue engine: scheduling, worker lifecycle, and event handling.
//!
//! [`QueueEngine`] is the single-threaded facade the UI drives. All queue
//! mutation happens through `&mut self` on the owning thread; background
//! workers only ever post [`WorkerEvent`]s into a channel, which the owning
//! thread drains with [`QueueEngine::drain_events`] on its tick.
//!
//! The engine also owns the autostart scheduler: whenever the queue changes
//! shape or a download reaches a terminal state, the next eligible items in
//! visual order are started until the concurrency limit is saturated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{FormatSelection, MISSING, MediaFormat, custom_args_pin_format};
use crate::metadata::{MediaInfo, format_filesize};
use crate::queue::{
    COL_EXT, COL_FILESIZE, COL_FORMAT, COL_FORMAT_NOTE, DragOutcome, QueueItem, QueueTable,
    ScrollDirection, SelectMode, ThumbnailPreview,
};
use crate::status::DownloadStatus;
use crate::thumbnail;
use crate::tool::{DownloadRequest, MediaTool, ToolOutcome};
use crate::worker::{EventReceiver, EventSender, WorkerEvent, WorkerKind};

/// Warning text surfaced when a manual format selection is made while the
/// custom arguments already pin a format. Non-blocking; the selection is
/// still recorded but the custom arguments win at execution time.
pub const CUSTOM_ARGS_FORMAT_WARNING: &str =
    "The custom arguments already contain a format option (-f); \
     they override the formats selected here.";

/// Per-status counts over the whole queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Total number of items.
    pub total: usize,
    /// Items waiting with no worker activity yet.
    pub queued: usize,
    /// Items whose metadata fetch is running.
    pub fetching_info: usize,
    /// Items with metadata, ready to download.
    pub ready: usize,
    /// Items currently downloading.
    pub downloading: usize,
    /// Items downloaded successfully.
    pub done: usize,
    /// Items stopped by the user.
    pub stopped: usize,
    /// Items that failed.
    pub error: usize,
}

/// The facade the UI thread drives.
pub struct QueueEngine {
    table: QueueTable,
    config: Config,
    tool: Arc<dyn MediaTool>,
    events_tx: EventSender,
    events_rx: EventReceiver,
    autostart_enabled: bool,
    autostart_suspended: bool,
    bulk_working: Arc<AtomicBool>,
}

impl std::fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEngine")
            .field("items", &self.table.len())
            .field("autostart_enabled", &self.autostart_enabled)
            .finish_non_exhaustive()
    }
}

impl QueueEngine {
    /// Create an engine over the given tool.
    #[must_use]
    pub fn new(config: Config, tool: Arc<dyn MediaTool>) -> Self {
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        Self {
            table: QueueTable::new(),
            config,
            tool,
            events_tx,
            events_rx,
            autostart_enabled: true,
            autostart_suspended: false,
            bulk_working: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The queue table, read-only.
    #[must_use]
    pub const fn table(&self) -> &QueueTable {
        &self.table
    }

    /// The item bound to a URL.
    #[must_use]
    pub fn item(&self, url: &str) -> Option<&QueueItem> {
        self.table.get(url)
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current configuration, mutable.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Enable or disable the autostart scheduler.
    pub fn set_autostart(&mut self, enabled: bool) {
        self.autostart_enabled = enabled;
        if enabled {
            self.maybe_autostart();
        }
    }

    /// Per-status counts.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: self.table.len(),
            ..QueueStats::default()
        };
        for item in self.table.items() {
            match item.status() {
                DownloadStatus::Queued => stats.queued += 1,
                DownloadStatus::FetchingInfo => stats.fetching_info += 1,
                DownloadStatus::Ready => stats.ready += 1,
                DownloadStatus::Downloading => stats.downloading += 1,
                DownloadStatus::Done => stats.done += 1,
                DownloadStatus::Stopped => stats.stopped += 1,
                DownloadStatus::Error(_) => stats.error += 1,
            }
        }
        stats
    }

    // ---- adding and metadata -------------------------------------------

    /// Add a URL to the queue and start fetching its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateUrl`] when the URL is already queued.
    pub fn add_url(&mut self, url: &str) -> Result<()> {
        let tool = Arc::clone(&self.tool);
        let tx = self.events_tx.clone();
        let item = self.table.add(url)?;
        item.set_status(DownloadStatus::FetchingInfo);
        let u = url.to_string();
        item.workers.spawn(WorkerKind::Info, url, move |token| {
            match tool.fetch_info(&u, &token) {
                Ok(ToolOutcome::Completed(info)) => {
                    let _ = tx.send(WorkerEvent::InfoFetched { url: u, info });
                }
                Ok(ToolOutcome::Cancelled) => {}
                Err(e) => {
                    let _ = tx.send(WorkerEvent::InfoFailed {
                        url: u,
                        reason: e.to_string(),
                    });
                }
            }
        });
        Ok(())
    }

    /// Start fetching the item's thumbnail, if its metadata reported one.
    ///
    /// Returns `false` when no fetch was started (no thumbnail URL, or a
    /// fetch is already running). Thumbnail failures never touch the item's
    /// status; they only produce a placeholder message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn fetch_thumbnail(&mut self, url: &str) -> Result<bool> {
        let tx = self.events_tx.clone();
        let Some(item) = self.table.get_mut(url) else {
            return Err(Error::NoSuchItem(url.to_string()));
        };
        let Some(thumb_url) = item.info.as_ref().and_then(|i| i.thumbnail_url.clone()) else {
            item.thumbnail =
                Some(ThumbnailPreview::Placeholder("no thumbnail available".to_string()));
            return Ok(false);
        };
        let u = url.to_string();
        Ok(item.workers.spawn(WorkerKind::Thumbnail, url, move |token| {
            let result = thumbnail::fetch_thumbnail(
                &thumb_url,
                Duration::from_secs(thumbnail::DEFAULT_FETCH_TIMEOUT_SECS),
            );
            if token.is_cancelled() {
                return;
            }
            let event = match result {
                Ok(bytes) => {
                    if thumbnail::image_kind(&bytes).is_some() {
                        WorkerEvent::ThumbnailReady { url: u, bytes }
                    } else {
                        WorkerEvent::ThumbnailFailed {
                            url: u,
                            message: thumbnail::unsupported_format_message(&thumb_url),
                        }
                    }
                }
                Err(e) => WorkerEvent::ThumbnailFailed {
                    url: u,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(event);
        }))
    }

    // ---- starting and stopping -----------------------------------------

    /// Number of items currently downloading.
    #[must_use]
    pub fn downloading_count(&self) -> usize {
        self.table
            .items()
            .filter(|i| matches!(i.status(), DownloadStatus::Downloading))
            .count()
    }

    /// Whether the concurrency limit is reached.
    #[must_use]
    pub fn saturated(&self) -> bool {
        self.config
            .download_limit()
            .is_some_and(|limit| self.downloading_count() >= limit)
    }

    /// Start downloading an item.
    ///
    /// Returns `false` without starting anything when the item is already
    /// downloading, is not in a startable state, or the concurrency limit is
    /// saturated. Starting is idempotent; a second start of a running item
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn start_download(&mut self, url: &str) -> Result<bool> {
        let limit_reached = self.saturated();
        let output_dir = self.config.output_dir.clone();
        let extra_args: Vec<String> = if self.config.use_custom_args {
            self.config
                .custom_args
                .split_whitespace()
                .map(String::from)
                .collect()
        } else {
            Vec::new()
        };
        let tool = Arc::clone(&self.tool);
        let tx = self.events_tx.clone();

        let Some(item) = self.table.get_mut(url) else {
            return Err(Error::NoSuchItem(url.to_string()));
        };
        if item.workers.is_running(WorkerKind::Download)
            || matches!(item.status(), DownloadStatus::Downloading)
        {
            debug!("Download already running for {}", url);
            return Ok(false);
        }
        if !item.status().is_startable() {
            debug!("Item {} is {}, not startable", url, item.status());
            return Ok(false);
        }
        if limit_reached {
            info!("Not starting {}: download limit reached", url);
            return Ok(false);
        }

        let request = DownloadRequest {
            url: url.to_string(),
            output_dir,
            format: item.selection.as_ref().and_then(FormatSelection::combined),
            extra_args,
        };
        item.set_status(DownloadStatus::Downloading);
        let u = url.to_string();
        item.workers.spawn(WorkerKind::Download, url, move |token| {
            let mut progress = |percent, line: &str| {
                let _ = tx.send(WorkerEvent::DownloadProgress {
                    url: u.clone(),
                    percent,
                    line: line.to_string(),
                });
            };
            let result = tool.download(&request, &token, &mut progress);
            let event = match result {
                Ok(ToolOutcome::Completed(())) => WorkerEvent::DownloadFinished { url: u },
                Ok(ToolOutcome::Cancelled) => WorkerEvent::DownloadStopped { url: u },
                Err(e) => WorkerEvent::DownloadFailed {
                    url: u,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(event);
        });
        Ok(true)
    }

    /// Stop the item's running worker: the download if one is running,
    /// otherwise the metadata fetch. The stop is a signal; the worker exits
    /// at its next poll point and its handle is reaped from the event drain.
    ///
    /// Returns `false` when nothing was running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn stop_item(&mut self, url: &str) -> Result<bool> {
        let Some(item) = self.table.get_mut(url) else {
            return Err(Error::NoSuchItem(url.to_string()));
        };
        if item.workers.is_running(WorkerKind::Download) {
            item.workers.signal(WorkerKind::Download);
            if matches!(item.status(), DownloadStatus::Downloading) {
                item.set_status(DownloadStatus::Stopped);
            }
            info!("Stopping download of {}", url);
            return Ok(true);
        }
        if item.workers.is_running(WorkerKind::Info) {
            item.workers.signal(WorkerKind::Info);
            if matches!(item.status(), DownloadStatus::FetchingInfo) {
                item.set_status(DownloadStatus::Queued);
            }
            info!("Stopping metadata fetch of {}", url);
            return Ok(true);
        }
        Ok(false)
    }

    // ---- the autostart scheduler ---------------------------------------

    /// URL of the next item the scheduler would start, scanning visual order
    /// from the top (or from just below `after`'s position).
    ///
    /// Returns `None` when the concurrency limit is saturated or no item is
    /// eligible. Errored items are skipped; restarting them is the user's
    /// call.
    #[must_use]
    pub fn next_startable_url(&self, after: Option<&str>) -> Option<String> {
        if self.saturated() {
            return None;
        }
        let after_ordinal = after
            .and_then(|u| self.table.get(u))
            .map_or(0, QueueItem::ordinal);
        self.table
            .items()
            .find(|i| i.ordinal() > after_ordinal && i.status().is_autostartable())
            .map(|i| i.url().to_string())
    }

    fn maybe_autostart(&mut self) {
        if !self.autostart_enabled || self.autostart_suspended {
            return;
        }
        while let Some(url) = self.next_startable_url(None) {
            match self.start_download(&url) {
                Ok(true) => debug!("Autostarted {}", url),
                _ => break,
            }
        }
    }

    // ---- drag reorder --------------------------------------------------

    /// Apply a click on a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn select(&mut self, url: &str, mode: SelectMode) -> Result<()> {
        self.table.select(url, mode)
    }

    /// Begin a drag gesture on the hovered row.
    ///
    /// # Errors
    ///
    /// Propagates the table's drag preconditions.
    pub fn begin_drag(&mut self, url: &str) -> Result<()> {
        self.table.begin_drag(url)
    }

    /// Move the dragged row to the hovered slot.
    ///
    /// # Errors
    ///
    /// Propagates the table's drag preconditions.
    pub fn drag_over(&mut self, slot: usize) -> Result<()> {
        self.table.drag_over(slot)
    }

    /// Advance the drag autoscroll timer.
    pub fn autoscroll(
        &mut self,
        edge: Option<ScrollDirection>,
        now: Instant,
    ) -> Option<ScrollDirection> {
        self.table.autoscroll(edge, now)
    }

    /// Finish the drag gesture and reconcile the scheduler with the new
    /// order.
    ///
    /// When the reorder moved a waiting item above a running one (or a
    /// running item below a waiting one), the pair is swapped atomically:
    /// one stop and one start, so the set of active downloads tracks visual
    /// order without exceeding the limit.
    pub fn end_drag(&mut self) -> Option<DragOutcome> {
        let outcome = self.table.end_drag()?;
        self.apply_drag_boundary(&outcome);
        self.maybe_autostart();
        Some(outcome)
    }

    fn apply_drag_boundary(&mut self, outcome: &DragOutcome) {
        let Some(moved) = self.table.get(&outcome.url) else {
            return;
        };
        let moved_ordinal = moved.ordinal();
        let moved_status = moved.status().clone();

        if matches!(moved_status, DownloadStatus::Downloading) {
            // A running item dragged below a waiting one yields its slot.
            let first_waiting = self
                .table
                .items()
                .find(|i| i.status().is_autostartable())
                .map(|i| (i.url().to_string(), i.ordinal()));
            if let Some((url, ordinal)) = first_waiting {
                if moved_ordinal > ordinal {
                    info!(
                        "Reorder: {} now below waiting {}, swapping",
                        outcome.url, url
                    );
                    let _ = self.stop_item(&outcome.url);
                    let _ = self.start_download(&url);
                }
            }
        } else if moved_status.is_autostartable() {
            // A waiting item dragged above a running one takes its slot.
            let last_running = self
                .table
                .items()
                .filter(|i| matches!(i.status(), DownloadStatus::Downloading))
                .last()
                .map(|i| (i.url().to_string(), i.ordinal()));
            if let Some((url, ordinal)) = last_running {
                if moved_ordinal < ordinal {
                    info!(
                        "Reorder: {} now above running {}, swapping",
                        outcome.url, url
                    );
                    let _ = self.stop_item(&url);
                    let _ = self.start_download(&outcome.url);
                }
            }
        }
    }

    // ---- removal and bulk operations -----------------------------------

    /// Remove an item, stopping and joining its workers first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn remove_item(&mut self, url: &str) -> Result<()> {
        let Some(item) = self.table.get_mut(url) else {
            return Err(Error::NoSuchItem(url.to_string()));
        };
        item.workers.stop_and_join_all();
        self.table.remove(url);
        self.maybe_autostart();
        Ok(())
    }

    /// Handle that interrupts a running bulk operation when set to `false`.
    #[must_use]
    pub fn bulk_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.bulk_working)
    }

    /// Interrupt the bulk operation currently in progress, if any. The loop
    /// finishes its current item and stops; everything already processed
    /// stays processed.
    pub fn request_bulk_stop(&self) {
        self.bulk_working.store(false, Ordering::Relaxed);
    }

    /// Start every startable item until the limit is saturated. Returns the
    /// number of downloads started.
    pub fn start_all(&mut self) -> usize {
        self.bulk_working.store(true, Ordering::Relaxed);
        self.autostart_suspended = true;
        self.table.set_auto_draw(false);
        let urls: Vec<String> = self
            .table
            .items()
            .filter(|i| i.status().is_startable())
            .map(|i| i.url().to_string())
            .collect();
        let mut started = 0;
        for url in urls {
            if !self.bulk_working.load(Ordering::Relaxed) {
                info!("Bulk start interrupted");
                break;
            }
            if self.saturated() {
                break;
            }
            if matches!(self.start_download(&url), Ok(true)) {
                started += 1;
            }
        }
        self.table.set_auto_draw(true);
        self.autostart_suspended = false;
        started
    }

    /// Signal every running item to stop. Returns the number signalled.
    pub fn stop_all(&mut self) -> usize {
        self.bulk_working.store(true, Ordering::Relaxed);
        self.autostart_suspended = true;
        self.table.set_auto_draw(false);
        let urls: Vec<String> = self
            .table
            .items()
            .filter(|i| i.status().is_stoppable())
            .map(|i| i.url().to_string())
            .collect();
        let mut stopped = 0;
        for url in urls {
            if !self.bulk_working.load(Ordering::Relaxed) {
                info!("Bulk stop interrupted");
                break;
            }
            if matches!(self.stop_item(&url), Ok(true)) {
                stopped += 1;
            }
        }
        self.table.set_auto_draw(true);
        self.autostart_suspended = false;
        stopped
    }

    /// Remove the selected items. Returns the number removed.
    pub fn remove_selected(&mut self) -> usize {
        let urls = self.table.selected_urls();
        self.remove_many(urls)
    }

    /// Remove every item. Returns the number removed.
    pub fn remove_all(&mut self) -> usize {
        let urls: Vec<String> = self.table.items().map(|i| i.url().to_string()).collect();
        self.remove_many(urls)
    }

    /// Remove every item that finished downloading. Returns the number
    /// removed.
    pub fn clear_completed(&mut self) -> usize {
        let urls: Vec<String> = self
            .table
            .items()
            .filter(|i| matches!(i.status(), DownloadStatus::Done))
            .map(|i| i.url().to_string())
            .collect();
        self.remove_many(urls)
    }

    fn remove_many(&mut self, urls: Vec<String>) -> usize {
        self.bulk_working.store(true, Ordering::Relaxed);
        self.autostart_suspended = true;
        self.table.set_auto_draw(false);
        let mut removed = 0;
        for url in urls {
            if !self.bulk_working.load(Ordering::Relaxed) {
                info!("Bulk removal interrupted after {} items", removed);
                break;
            }
            if let Some(item) = self.table.get_mut(&url) {
                item.workers.stop_and_join_all();
                self.table.remove(&url);
                removed += 1;
            }
        }
        self.table.set_auto_draw(true);
        self.autostart_suspended = false;
        self.maybe_autostart();
        removed
    }

    /// Stop and join every worker of every item. Called on application exit;
    /// afterwards no background thread is alive.
    pub fn shutdown(&mut self) {
        self.autostart_enabled = false;
        for item in self.table.items_mut() {
            item.workers.signal_all();
        }
        for item in self.table.items_mut() {
            item.workers.stop_and_join_all();
        }
        self.drain_events();
        info!("Queue engine shut down");
    }

    // ---- format selection ----------------------------------------------

    /// Record the manual format selection for an item and refresh its format
    /// columns from the matching metadata.
    ///
    /// Returns a warning message when the custom arguments already pin a
    /// format; the selection is recorded regardless and the custom arguments
    /// win at execution time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn select_formats(
        &mut self,
        url: &str,
        selection: FormatSelection,
    ) -> Result<Option<String>> {
        let conflict = self.config.use_custom_args
            && custom_args_pin_format(&self.config.custom_args);
        self.config.fmt1 = selection.primary.clone().unwrap_or_default();
        self.config.fmt2 = selection.secondary.clone().unwrap_or_default();

        let Some(item) = self.table.get_mut(url) else {
            return Err(Error::NoSuchItem(url.to_string()));
        };
        item.set_column(
            COL_FORMAT,
            selection
                .combined()
                .unwrap_or_else(|| MISSING.to_string()),
        );
        let details = item.info.as_ref().and_then(|info| {
            let primary = selection.primary.as_deref()?;
            let fmt = info.formats.iter().find(|f| f.format_id == primary)?;
            let size = match selection.secondary.as_deref() {
                Some(sec) => fmt.display_size().zip(
                    info.formats
                        .iter()
                        .find(|f| f.format_id == sec)
                        .and_then(MediaFormat::display_size),
                )
                .map(|((a, ap), (b, bp))| (a + b, ap || bp)),
                None => fmt.display_size(),
            };
            Some((fmt.note().to_string(), fmt.ext.clone(), size))
        });
        if let Some((note, ext, size)) = details {
            item.set_column(COL_FORMAT_NOTE, note);
            item.set_column(COL_EXT, ext);
            item.set_column(
                COL_FILESIZE,
                size.map_or_else(
                    || MISSING.to_string(),
                    |(bytes, approx)| {
                        let text = format_filesize(bytes);
                        if approx { format!("~{text}") } else { text }
                    },
                ),
            );
        }
        item.selection = (!selection.is_empty()).then_some(selection);

        if conflict {
            warn!("Manual format selection made while custom arguments pin a format");
            return Ok(Some(CUSTOM_ARGS_FORMAT_WARNING.to_string()));
        }
        Ok(None)
    }

    // ---- worker events -------------------------------------------------

    /// Drain pending worker events, updating item state. Called on the UI
    /// tick; returns the number of events processed.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        if !self.table.contains(event.url()) {
            // The item was removed while the event was in flight.
            debug!("Discarding event for removed item {}", event.url());
            return;
        }
        match event {
            WorkerEvent::InfoFetched { url, info } => {
                if let Some(item) = self.table.get_mut(&url) {
                    item.workers.reap(WorkerKind::Info);
                    item.apply_info(MediaInfo::from_json(&info));
                    if matches!(item.status(), DownloadStatus::FetchingInfo) {
                        item.set_status(DownloadStatus::Ready);
                    }
                }
                self.maybe_autostart();
            }
            WorkerEvent::InfoFailed { url, reason } => {
                if let Some(item) = self.table.get_mut(&url) {
                    warn!("Metadata fetch failed for {}: {}", url, reason);
                    item.workers.reap(WorkerKind::Info);
                    if matches!(item.status(), DownloadStatus::FetchingInfo) {
                        item.set_status(DownloadStatus::Error(reason));
                    }
                }
            }
            WorkerEvent::DownloadProgress { url, percent, .. } => {
                if let Some(item) = self.table.get_mut(&url) {
                    if matches!(item.status(), DownloadStatus::Downloading) {
                        if let Some(percent) = percent {
                            item.set_progress_text(percent);
                        }
                    }
                }
            }
            WorkerEvent::DownloadFinished { url } => {
                if let Some(item) = self.table.get_mut(&url) {
                    info!("Download finished: {}", url);
                    item.workers.reap(WorkerKind::Download);
                    item.set_status(DownloadStatus::Done);
                }
                self.maybe_autostart();
            }
            WorkerEvent::DownloadStopped { url } => {
                if let Some(item) = self.table.get_mut(&url) {
                    item.workers.reap(WorkerKind::Download);
                    if matches!(item.status(), DownloadStatus::Downloading) {
                        item.set_status(DownloadStatus::Stopped);
                    }
                }
            }
            WorkerEvent::DownloadFailed { url, reason } => {
                if let Some(item) = self.table.get_mut(&url) {
                    warn!("Download failed for {}: {}", url, reason);
                    item.workers.reap(WorkerKind::Download);
                    if matches!(item.status(), DownloadStatus::Downloading) {
                        item.set_status(DownloadStatus::Error(reason));
                    }
                }
                self.maybe_autostart();
            }
            WorkerEvent::ThumbnailReady { url, bytes } => {
                if let Some(item) = self.table.get_mut(&url) {
                    item.workers.reap(WorkerKind::Thumbnail);
                    item.thumbnail = Some(ThumbnailPreview::Image(bytes));
                }
            }
            WorkerEvent::ThumbnailFailed { url, message } => {
                if let Some(item) = self.table.get_mut(&url) {
                    item.workers.reap(WorkerKind::Thumbnail);
                    item.thumbnail = Some(ThumbnailPreview::Placeholder(message));
                }
            }
        }
    }
}
