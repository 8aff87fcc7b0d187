//! The queue table: ordered rows, selection, and drag reorder.
//!
//! Visual position is the single source of truth for order. Every row holds
//! a 1-based ordinal that is kept a dense permutation of `1..=N` across
//! insertions, removals and reorders; the ordinal belongs to the slot, the
//! rest of the row data travels with the item.
//!
//! A drag gesture is an explicit [`DragSession`] value owned by the table
//! for the duration of one gesture: it captures the dragged row's full data
//! payload up front, tracks the hovered slot, and owns the autoscroll timer
//! state. Reorders happen as redraw-suppressed batches so a gesture repaints
//! once, not once per shifted row.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::MISSING;
use crate::metadata::MediaInfo;
use crate::status::DownloadStatus;
use crate::worker::WorkerSet;

/// Data columns carried by a row (the ordinal column is slot-owned).
pub const COLUMN_COUNT: usize = 7;

/// Index of the website column.
pub const COL_SITE: usize = 0;
/// Index of the media-title column.
pub const COL_TITLE: usize = 1;
/// Index of the status column.
pub const COL_STATUS: usize = 2;
/// Index of the format-id column.
pub const COL_FORMAT: usize = 3;
/// Index of the format-note column.
pub const COL_FORMAT_NOTE: usize = 4;
/// Index of the extension column.
pub const COL_EXT: usize = 5;
/// Index of the filesize column.
pub const COL_FILESIZE: usize = 6;

/// Row data columns.
pub type Columns = [String; COLUMN_COUNT];

/// Interval between autoscroll steps while dragging near a view edge.
pub const AUTOSCROLL_INTERVAL: Duration = Duration::from_millis(25);

/// Row coloring, normal or the distinct drag highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowHighlight {
    /// Normal foreground color.
    #[default]
    Normal,
    /// The row currently carried by a drag gesture.
    DragSource,
}

/// Direction of drag autoscroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Pointer near the top edge; scroll up.
    Up,
    /// Pointer near the bottom edge; scroll down.
    Down,
}

/// How a row was clicked, deciding the selection outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Plain left click: the row becomes the only selected row and the
    /// active row driving the detail view.
    Single,
    /// Left click with a modifier key: toggles membership in the selection
    /// without changing the active row.
    Toggle,
    /// Right click: adds the row if nothing is selected, but never clears
    /// an existing multi-selection.
    Context,
}

/// What the thumbnail preview surface shows for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailPreview {
    /// Fetched image bytes.
    Image(Vec<u8>),
    /// Placeholder message; thumbnail failures never touch item status.
    Placeholder(String),
}

/// One user-submitted download job and its row state.
#[derive(Debug)]
pub struct QueueItem {
    url: String,
    ordinal: usize,
    columns: Columns,
    status: DownloadStatus,
    selected: bool,
    highlight: RowHighlight,
    /// Fetched metadata, arrives asynchronously.
    pub info: Option<MediaInfo>,
    /// Manual format selection, when the user made one.
    pub selection: Option<crate::format::FormatSelection>,
    /// What the preview surface shows for this item.
    pub thumbnail: Option<ThumbnailPreview>,
    /// Background workers owned by this item.
    pub workers: WorkerSet,
}

impl QueueItem {
    fn new(url: String, ordinal: usize) -> Self {
        let mut columns: Columns = std::array::from_fn(|_| MISSING.to_string());
        columns[COL_TITLE] = "...".to_string();
        columns[COL_STATUS] = DownloadStatus::Queued.to_string();
        Self {
            url,
            ordinal,
            columns,
            status: DownloadStatus::Queued,
            selected: false,
            highlight: RowHighlight::Normal,
            info: None,
            selection: None,
            thumbnail: None,
            workers: WorkerSet::new(),
        }
    }

    /// The item's URL, its unique key and bound row value.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 1-based display position.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The row's data columns.
    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    /// One data column's text.
    #[must_use]
    pub fn column(&self, index: usize) -> &str {
        &self.columns[index]
    }

    /// Set one data column's text.
    pub fn set_column(&mut self, index: usize, text: impl Into<String>) {
        self.columns[index] = text.into();
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &DownloadStatus {
        &self.status
    }

    /// Set the status, keeping the status column in sync.
    pub fn set_status(&mut self, status: DownloadStatus) {
        self.columns[COL_STATUS] = status.to_string();
        self.status = status;
    }

    /// Show download progress in the status column.
    pub fn set_progress_text(&mut self, percent: f32) {
        self.columns[COL_STATUS] = format!("downloading {percent:.1}%");
    }

    /// Fill the site and title columns from fetched metadata.
    pub fn apply_info(&mut self, info: MediaInfo) {
        self.columns[COL_SITE] = info.site.clone();
        self.columns[COL_TITLE] = info.title.clone();
        self.info = Some(info);
    }

    /// Whether the row is selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Current row coloring.
    #[must_use]
    pub const fn highlight(&self) -> RowHighlight {
        self.highlight
    }
}

/// The move performed by a completed drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOutcome {
    /// URL of the moved row.
    pub url: String,
    /// Slot the gesture started at.
    pub from: usize,
    /// Slot the row ended up in.
    pub to: usize,
}

/// State of one in-progress drag gesture.
#[derive(Debug)]
pub struct DragSession {
    url: String,
    payload: Columns,
    origin: usize,
    current: usize,
    scroll: Option<ScrollDirection>,
    last_scroll_fire: Option<Instant>,
}

impl DragSession {
    /// URL of the dragged row.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The data columns captured when the gesture began.
    #[must_use]
    pub const fn payload(&self) -> &Columns {
        &self.payload
    }

    /// Slot the gesture started at.
    #[must_use]
    pub const fn origin(&self) -> usize {
        self.origin
    }

    /// Slot the dragged row currently occupies.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }
}

/// Ordered table of queue items.
#[derive(Debug, Default)]
pub struct QueueTable {
    items: Vec<QueueItem>,
    active: Option<String>,
    drag: Option<DragSession>,
    auto_draw: bool,
    redraws: u64,
}

impl QueueTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            active: None,
            drag: None,
            auto_draw: true,
            redraws: 0,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate rows in visual order.
    pub fn items(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Iterate rows mutably in visual order.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut QueueItem> {
        self.items.iter_mut()
    }

    /// Whether a row exists for the URL.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.items.iter().any(|i| i.url == url)
    }

    /// Visual slot of the row with the given URL.
    #[must_use]
    pub fn position(&self, url: &str) -> Option<usize> {
        self.items.iter().position(|i| i.url == url)
    }

    /// The row bound to the URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&QueueItem> {
        self.items.iter().find(|i| i.url == url)
    }

    /// The row bound to the URL, mutable.
    pub fn get_mut(&mut self, url: &str) -> Option<&mut QueueItem> {
        self.items.iter_mut().find(|i| i.url == url)
    }

    /// The row at a visual slot.
    #[must_use]
    pub fn item_at(&self, slot: usize) -> Option<&QueueItem> {
        self.items.get(slot)
    }

    /// Append a new row for the URL. URLs are unique keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateUrl`] when a row for the URL exists.
    pub fn add(&mut self, url: &str) -> Result<&mut QueueItem> {
        if self.contains(url) {
            return Err(Error::DuplicateUrl(url.to_string()));
        }
        let ordinal = self.items.len() + 1;
        self.items.push(QueueItem::new(url.to_string(), ordinal));
        self.request_redraw();
        debug!("Added queue item #{} {}", ordinal, url);
        Ok(self
            .items
            .last_mut()
            .unwrap_or_else(|| unreachable!("row was just pushed")))
    }

    /// Suppress or restore redraws. Restoring counts as one redraw request,
    /// which is how bulk updates repaint once.
    pub fn set_auto_draw(&mut self, enabled: bool) {
        let was = self.auto_draw;
        self.auto_draw = enabled;
        if enabled && !was {
            self.redraws += 1;
        }
    }

    /// Number of repaints requested so far (observable for tests).
    #[must_use]
    pub const fn redraw_count(&self) -> u64 {
        self.redraws
    }

    fn request_redraw(&mut self) {
        if self.auto_draw {
            self.redraws += 1;
        }
    }

    /// The row driving the detail view, if any.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Apply a click on a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchItem`] for an unknown URL.
    pub fn select(&mut self, url: &str, mode: SelectMode) -> Result<()> {
        if !self.contains(url) {
            return Err(Error::NoSuchItem(url.to_string()));
        }
        match mode {
            SelectMode::Single => {
                for item in &mut self.items {
                    item.selected = item.url == url;
                }
                self.active = Some(url.to_string());
            }
            SelectMode::Toggle => {
                if let Some(item) = self.get_mut(url) {
                    item.selected = !item.selected;
                }
            }
            SelectMode::Context => {
                let any_selected = self.items.iter().any(|i| i.selected);
                if !any_selected {
                    if let Some(item) = self.get_mut(url) {
                        item.selected = true;
                    }
                }
            }
        }
        self.request_redraw();
        Ok(())
    }

    /// Deselect every row.
    pub fn clear_selection(&mut self) {
        for item in &mut self.items {
            item.selected = false;
        }
        self.request_redraw();
    }

    /// URLs of the selected rows, in visual order.
    #[must_use]
    pub fn selected_urls(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.url.clone())
            .collect()
    }

    /// The in-progress drag gesture, if any.
    #[must_use]
    pub const fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Begin a drag gesture on the hovered row.
    ///
    /// Dragging requires exactly one selected row; with no selection the
    /// hovered row is promoted to selected first. The dragged row's full
    /// data payload is captured before any mutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDrag`] when a gesture is already in progress
    /// or more than one row is selected.
    pub fn begin_drag(&mut self, hovered_url: &str) -> Result<()> {
        if self.drag.is_some() {
            return Err(Error::InvalidDrag("drag already in progress".to_string()));
        }
        if !self.contains(hovered_url) {
            return Err(Error::NoSuchItem(hovered_url.to_string()));
        }
        if self.selected_urls().is_empty() {
            self.select(hovered_url, SelectMode::Single)?;
        }
        let selection = self.selected_urls();
        let [url] = selection.as_slice() else {
            return Err(Error::InvalidDrag(format!(
                "drag requires exactly one selected row, {} are selected",
                selection.len()
            )));
        };
        let origin = self
            .position(url)
            .unwrap_or_else(|| unreachable!("selected row is in the table"));
        let payload = self.items[origin].columns.clone();
        debug!("Drag started on #{} {}", origin + 1, url);
        self.drag = Some(DragSession {
            url: url.clone(),
            payload,
            origin,
            current: origin,
            scroll: None,
            last_scroll_fire: None,
        });
        Ok(())
    }

    /// Move the dragged row to the hovered slot.
    ///
    /// Every row strictly between the old and new position shifts one slot
    /// toward the old position, closing the gap; the dragged row lands in
    /// the hovered slot, selected and drag-highlighted. The whole update is
    /// one redraw-suppressed batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDrag`] when no gesture is in progress or the
    /// slot is out of range.
    pub fn drag_over(&mut self, hovered_slot: usize) -> Result<()> {
        let Some(session) = self.drag.as_mut() else {
            return Err(Error::InvalidDrag("no drag in progress".to_string()));
        };
        if hovered_slot >= self.items.len() {
            return Err(Error::InvalidDrag(format!(
                "slot {hovered_slot} out of range"
            )));
        }
        let current = session.current;
        if hovered_slot == current {
            return Ok(());
        }
        session.current = hovered_slot;

        self.set_auto_draw(false);
        let item = self.items.remove(current);
        self.items.insert(hovered_slot, item);
        self.renumber();
        for (slot, item) in self.items.iter_mut().enumerate() {
            item.selected = slot == hovered_slot;
            item.highlight = if slot == hovered_slot {
                RowHighlight::DragSource
            } else {
                RowHighlight::Normal
            };
        }
        self.set_auto_draw(true);
        Ok(())
    }

    /// Advance the autoscroll timer for the current gesture.
    ///
    /// `edge` is the view edge the pointer is near (or `None` when away from
    /// both). Returns the direction to scroll one step when the ~25 ms
    /// interval has elapsed since the previous step.
    pub fn autoscroll(
        &mut self,
        edge: Option<ScrollDirection>,
        now: Instant,
    ) -> Option<ScrollDirection> {
        let session = self.drag.as_mut()?;
        let Some(direction) = edge else {
            session.scroll = None;
            session.last_scroll_fire = None;
            return None;
        };
        if session.scroll != Some(direction) {
            // Direction changed or timer newly started; first step after one interval.
            session.scroll = Some(direction);
            session.last_scroll_fire = Some(now);
            return None;
        }
        match session.last_scroll_fire {
            Some(last) if now.duration_since(last) >= AUTOSCROLL_INTERVAL => {
                session.last_scroll_fire = Some(now);
                Some(direction)
            }
            _ => None,
        }
    }

    /// Finish the drag gesture: restore row coloring, stop the autoscroll
    /// timer, destroy the session, and report the move that happened.
    ///
    /// Returns `None` when no gesture was in progress or the row never left
    /// its origin slot.
    pub fn end_drag(&mut self) -> Option<DragOutcome> {
        let session = self.drag.take()?;
        if let Some(item) = self.get_mut(&session.url) {
            item.highlight = RowHighlight::Normal;
        }
        self.request_redraw();
        debug!(
            "Drag ended: {} moved {} -> {}",
            session.url, session.origin, session.current
        );
        if session.origin == session.current {
            return None;
        }
        Some(DragOutcome {
            url: session.url,
            from: session.origin,
            to: session.current,
        })
    }

    /// Detach the row bound to the URL, renumbering the rows after it.
    ///
    /// The caller must have stopped and joined the item's workers; worker
    /// ownership is exclusive to the item and nothing may outlive it.
    pub fn remove(&mut self, url: &str) -> Option<QueueItem> {
        let slot = self.position(url)?;
        let item = self.items.remove(slot);
        debug_assert!(
            !item.workers.any_running(),
            "removing an item with live workers"
        );
        if self.active.as_deref() == Some(url) {
            self.active = None;
        }
        if let Some(session) = &self.drag {
            if session.url == url {
                self.drag = None;
            }
        }
        self.renumber();
        self.request_redraw();
        Some(item)
    }

    fn renumber(&mut self) {
        for (slot, item) in self.items.iter_mut().enumerate() {
            item.ordinal = slot + 1;
        }
    }

    /// Caption of the per-item options panel, kept in sync with the ordinal.
    #[must_use]
    pub fn option_caption(&self, url: &str) -> Option<String> {
        self.get(url)
            .map(|item| format!("Download options for queue item #{}", item.ordinal))
    }

    /// The ordinals in visual order (a dense `1..=N` by construction).
    #[must_use]
    pub fn ordinals(&self) -> Vec<usize> {
        self.items.iter().map(|i| i.ordinal).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table_with(n: usize) -> QueueTable {
        let mut table = QueueTable::new();
        for i in 1..=n {
            table.add(&format!("https://example.com/v/{i}")).unwrap();
        }
        table
    }

    fn url(i: usize) -> String {
        format!("https://example.com/v/{i}")
    }

    #[test]
    fn test_ordinals_dense_after_add_and_remove() {
        let mut table = table_with(5);
        assert_eq!(table.ordinals(), vec![1, 2, 3, 4, 5]);

        table.remove(&url(2));
        assert_eq!(table.ordinals(), vec![1, 2, 3, 4]);
        assert_eq!(table.get(&url(3)).unwrap().ordinal(), 2);

        table.add("https://example.com/v/9").unwrap();
        assert_eq!(table.ordinals(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let mut table = table_with(1);
        assert!(matches!(
            table.add(&url(1)),
            Err(Error::DuplicateUrl(_))
        ));
    }

    #[test]
    fn test_single_select_sets_active() {
        let mut table = table_with(3);
        table.select(&url(2), SelectMode::Single).unwrap();
        assert_eq!(table.active(), Some(url(2).as_str()));
        assert_eq!(table.selected_urls(), vec![url(2)]);

        // Modifier click adds to the selection without moving the active row.
        table.select(&url(3), SelectMode::Toggle).unwrap();
        assert_eq!(table.active(), Some(url(2).as_str()));
        assert_eq!(table.selected_urls(), vec![url(2), url(3)]);
    }

    #[test]
    fn test_context_click_preserves_multi_selection() {
        let mut table = table_with(3);
        table.select(&url(1), SelectMode::Single).unwrap();
        table.select(&url(2), SelectMode::Toggle).unwrap();
        table.select(&url(3), SelectMode::Context).unwrap();
        // The multi-selection stayed; the right-clicked row was not added.
        assert_eq!(table.selected_urls(), vec![url(1), url(2)]);
    }

    #[test]
    fn test_context_click_on_empty_selection_selects() {
        let mut table = table_with(2);
        table.select(&url(2), SelectMode::Context).unwrap();
        assert_eq!(table.selected_urls(), vec![url(2)]);
    }

    #[test]
    fn test_drag_requires_single_selection() {
        let mut table = table_with(3);
        table.select(&url(1), SelectMode::Single).unwrap();
        table.select(&url(2), SelectMode::Toggle).unwrap();
        assert!(matches!(
            table.begin_drag(&url(1)),
            Err(Error::InvalidDrag(_))
        ));
    }

    #[test]
    fn test_drag_with_no_selection_promotes_hovered_row() {
        let mut table = table_with(3);
        table.begin_drag(&url(2)).unwrap();
        assert_eq!(table.drag().unwrap().url(), url(2));
        assert_eq!(table.drag().unwrap().origin(), 1);
    }

    #[test]
    fn test_drag_down_closes_gap() {
        let mut table = table_with(5);
        table.select(&url(2), SelectMode::Single).unwrap();
        table.begin_drag(&url(2)).unwrap();
        table.drag_over(3).unwrap();

        let order: Vec<String> = table.items().map(|i| i.url().to_string()).collect();
        assert_eq!(order, vec![url(1), url(3), url(4), url(2), url(5)]);
        assert_eq!(table.ordinals(), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            table.get(&url(2)).unwrap().highlight(),
            RowHighlight::DragSource
        );

        let outcome = table.end_drag().unwrap();
        assert_eq!(outcome, DragOutcome { url: url(2), from: 1, to: 3 });
        assert_eq!(
            table.get(&url(2)).unwrap().highlight(),
            RowHighlight::Normal
        );
        assert!(table.drag().is_none());
    }

    #[test]
    fn test_drag_up_closes_gap() {
        let mut table = table_with(4);
        table.select(&url(4), SelectMode::Single).unwrap();
        table.begin_drag(&url(4)).unwrap();
        table.drag_over(0).unwrap();

        let order: Vec<String> = table.items().map(|i| i.url().to_string()).collect();
        assert_eq!(order, vec![url(4), url(1), url(2), url(3)]);
        assert_eq!(table.ordinals(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_drag_preserves_payload_and_identity() {
        let mut table = table_with(4);
        {
            let item = table.get_mut(&url(3)).unwrap();
            item.set_column(COL_TITLE, "A very specific title");
            item.set_column(COL_FILESIZE, "12.3 MB");
        }
        let before = table.get(&url(3)).unwrap().columns().clone();
        let mut urls_before: Vec<String> =
            table.items().map(|i| i.url().to_string()).collect();

        table.select(&url(3), SelectMode::Single).unwrap();
        table.begin_drag(&url(3)).unwrap();
        table.drag_over(0).unwrap();
        table.drag_over(2).unwrap();
        table.end_drag();

        assert_eq!(table.drag().map(DragSession::url), None);
        assert_eq!(table.get(&url(3)).unwrap().columns(), &before);

        let mut urls_after: Vec<String> =
            table.items().map(|i| i.url().to_string()).collect();
        urls_before.sort();
        urls_after.sort();
        assert_eq!(urls_before, urls_after);
    }

    #[test]
    fn test_drag_back_to_origin_reports_no_move() {
        let mut table = table_with(3);
        table.begin_drag(&url(2)).unwrap();
        table.drag_over(0).unwrap();
        table.drag_over(1).unwrap();
        assert_eq!(table.end_drag(), None);
    }

    #[test]
    fn test_drag_batch_redraws_once() {
        let mut table = table_with(5);
        table.select(&url(1), SelectMode::Single).unwrap();
        table.begin_drag(&url(1)).unwrap();
        let before = table.redraw_count();
        table.drag_over(4).unwrap();
        assert_eq!(table.redraw_count(), before + 1);
    }

    #[test]
    fn test_autoscroll_interval() {
        let mut table = table_with(3);
        table.begin_drag(&url(1)).unwrap();

        let t0 = Instant::now();
        // First observation arms the timer.
        assert_eq!(table.autoscroll(Some(ScrollDirection::Down), t0), None);
        // Too soon.
        assert_eq!(
            table.autoscroll(Some(ScrollDirection::Down), t0 + Duration::from_millis(10)),
            None
        );
        // Interval elapsed.
        assert_eq!(
            table.autoscroll(Some(ScrollDirection::Down), t0 + Duration::from_millis(30)),
            Some(ScrollDirection::Down)
        );
        // Leaving the edge stops the timer.
        assert_eq!(table.autoscroll(None, t0 + Duration::from_millis(40)), None);
        assert_eq!(
            table.autoscroll(Some(ScrollDirection::Down), t0 + Duration::from_millis(50)),
            None
        );
    }

    #[test]
    fn test_option_caption_tracks_ordinal() {
        let mut table = table_with(3);
        assert_eq!(
            table.option_caption(&url(3)).unwrap(),
            "Download options for queue item #3"
        );
        table.remove(&url(1));
        assert_eq!(
            table.option_caption(&url(3)).unwrap(),
            "Download options for queue item #2"
        );
    }

    #[test]
    fn test_remove_active_row_clears_active() {
        let mut table = table_with(2);
        table.select(&url(1), SelectMode::Single).unwrap();
        table.remove(&url(1));
        assert_eq!(table.active(), None);
    }
}
