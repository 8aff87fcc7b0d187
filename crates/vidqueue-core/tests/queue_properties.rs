//! End-to-end tests driving the queue engine with a scripted downloader.
//!
//! The fake tool blocks each download until the test finishes or cancels it,
//! which makes scheduler decisions observable at every step.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use vidqueue_core::{
    CancelToken, Config, DownloadRequest, DownloadStatus, Error, MediaTool, QueueEngine, Result,
    SelectMode, ToolOutcome,
};

/// Scripted downloader: metadata resolves immediately, downloads block until
/// the test marks them finished or they observe cancellation.
#[derive(Default)]
struct FakeTool {
    finish: Mutex<HashSet<String>>,
    // When a download of this URL is cancelled, clear the paired flag.
    on_cancel: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl FakeTool {
    fn finish_download(&self, url: &str) {
        self.finish.lock().unwrap().insert(url.to_string());
    }

    fn clear_flag_on_cancel(&self, url: &str, flag: Arc<AtomicBool>) {
        self.on_cancel.lock().unwrap().insert(url.to_string(), flag);
    }
}

impl MediaTool for FakeTool {
    fn fetch_info(&self, url: &str, token: &CancelToken) -> Result<ToolOutcome<Value>> {
        if token.is_cancelled() {
            return Ok(ToolOutcome::Cancelled);
        }
        Ok(ToolOutcome::Completed(json!({
            "title": format!("Video {url}"),
            "extractor_key": "Example",
            "duration": 130,
        })))
    }

    fn download(
        &self,
        request: &DownloadRequest,
        token: &CancelToken,
        progress: &mut dyn FnMut(Option<f32>, &str),
    ) -> Result<ToolOutcome<()>> {
        progress(Some(0.0), "[download]   0.0%");
        loop {
            if token.is_cancelled() {
                if let Some(flag) = self.on_cancel.lock().unwrap().get(&request.url) {
                    flag.store(false, Ordering::Relaxed);
                }
                return Ok(ToolOutcome::Cancelled);
            }
            if self.finish.lock().unwrap().contains(&request.url) {
                return Ok(ToolOutcome::Completed(()));
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

struct Harness {
    engine: QueueEngine,
    tool: Arc<FakeTool>,
}

fn url(i: usize) -> String {
    format!("https://example.com/v/{i}")
}

impl Harness {
    fn new(limit: i32) -> Self {
        // Initialize tracing for test output
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();

        let tool = Arc::new(FakeTool::default());
        let config = Config {
            max_concurrent_downloads: limit,
            output_dir: std::env::temp_dir(),
            ..Config::default()
        };
        let engine = QueueEngine::new(config, Arc::clone(&tool) as Arc<dyn MediaTool>);
        Self { engine, tool }
    }

    fn add_many(&mut self, n: usize) {
        for i in 1..=n {
            self.engine.add_url(&url(i)).unwrap();
        }
    }

    fn status(&self, i: usize) -> DownloadStatus {
        self.engine.item(&url(i)).unwrap().status().clone()
    }

    fn downloading_urls(&self) -> Vec<String> {
        self.engine
            .table()
            .items()
            .filter(|item| matches!(item.status(), DownloadStatus::Downloading))
            .map(|item| item.url().to_string())
            .collect()
    }

    fn pump_until(&mut self, mut done: impl FnMut(&QueueEngine) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            self.engine.drain_events();
            if done(&self.engine) {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("engine never reached the expected state");
    }
}

#[test]
fn ordinals_stay_dense_through_mixed_operations() {
    let mut h = Harness::new(1);
    h.engine.set_autostart(false);
    h.add_many(6);
    h.pump_until(|e| e.stats().ready == 6);

    h.engine.remove_item(&url(2)).unwrap();
    assert_eq!(h.engine.table().ordinals(), vec![1, 2, 3, 4, 5]);

    // Drag the last row to the top.
    h.engine.select(&url(6), SelectMode::Single).unwrap();
    h.engine.begin_drag(&url(6)).unwrap();
    h.engine.drag_over(0).unwrap();
    h.engine.end_drag().unwrap();
    assert_eq!(h.engine.table().ordinals(), vec![1, 2, 3, 4, 5]);

    let order: Vec<String> = h
        .engine
        .table()
        .items()
        .map(|i| i.url().to_string())
        .collect();
    assert_eq!(order, vec![url(6), url(1), url(3), url(4), url(5)]);

    // Selection-based removal keeps the permutation dense too.
    h.engine.select(&url(3), SelectMode::Single).unwrap();
    h.engine.select(&url(5), SelectMode::Toggle).unwrap();
    assert_eq!(h.engine.remove_selected(), 2);
    assert_eq!(h.engine.table().ordinals(), vec![1, 2, 3]);
}

#[test]
fn drag_preserves_row_payload_and_url_set() {
    let mut h = Harness::new(1);
    h.engine.set_autostart(false);
    h.add_many(4);
    h.pump_until(|e| e.stats().ready == 4);

    let before = h.engine.item(&url(3)).unwrap().columns().clone();
    let mut urls_before: Vec<String> = h
        .engine
        .table()
        .items()
        .map(|i| i.url().to_string())
        .collect();

    h.engine.select(&url(3), SelectMode::Single).unwrap();
    h.engine.begin_drag(&url(3)).unwrap();
    h.engine.drag_over(0).unwrap();
    // Mid-gesture: the row's data moved with it, byte for byte.
    assert_eq!(h.engine.item(&url(3)).unwrap().columns(), &before);
    h.engine.drag_over(3).unwrap();
    h.engine.end_drag().unwrap();

    assert_eq!(h.engine.item(&url(3)).unwrap().columns(), &before);
    let mut urls_after: Vec<String> = h
        .engine
        .table()
        .items()
        .map(|i| i.url().to_string())
        .collect();
    urls_before.sort();
    urls_after.sort();
    assert_eq!(urls_before, urls_after);
}

#[test]
fn active_downloads_track_visual_order() {
    let mut h = Harness::new(2);
    h.engine.set_autostart(false);
    h.add_many(4);
    h.pump_until(|e| e.stats().ready == 4);
    h.engine.set_autostart(true);
    assert_eq!(h.downloading_urls(), vec![url(1), url(2)]);

    // Completing one starts the next in visual order.
    h.tool.finish_download(&url(1));
    h.pump_until(|e| e.stats().done == 1 && e.stats().downloading == 2);
    assert_eq!(h.downloading_urls(), vec![url(2), url(3)]);

    // Dragging the waiting item above a running one swaps exactly that pair.
    h.engine.select(&url(4), SelectMode::Single).unwrap();
    h.engine.begin_drag(&url(4)).unwrap();
    h.engine.drag_over(2).unwrap();
    h.engine.end_drag().unwrap();

    assert!(matches!(h.status(4), DownloadStatus::Downloading));
    assert!(matches!(h.status(3), DownloadStatus::Stopped));
    assert_eq!(h.engine.stats().downloading, 2);
    h.engine.shutdown();
}

#[test]
fn running_item_dragged_below_waiting_yields_its_slot() {
    let mut h = Harness::new(1);
    h.engine.set_autostart(false);
    h.add_many(2);
    h.pump_until(|e| e.stats().ready == 2);
    h.engine.set_autostart(true);
    assert!(matches!(h.status(1), DownloadStatus::Downloading));

    h.engine.select(&url(1), SelectMode::Single).unwrap();
    h.engine.begin_drag(&url(1)).unwrap();
    h.engine.drag_over(1).unwrap();
    h.engine.end_drag().unwrap();

    assert!(matches!(h.status(1), DownloadStatus::Stopped));
    assert!(matches!(h.status(2), DownloadStatus::Downloading));
    assert_eq!(h.engine.stats().downloading, 1);
    h.engine.shutdown();
}

#[test]
fn interrupted_bulk_removal_leaves_queue_consistent() {
    let mut h = Harness::new(3);
    h.engine.set_autostart(false);
    h.add_many(5);
    h.pump_until(|e| e.stats().ready == 5);
    h.engine.set_autostart(true);
    assert_eq!(h.downloading_urls(), vec![url(1), url(2), url(3)]);

    // The third item's download worker clears the bulk flag when it observes
    // cancellation, so the sweep is interrupted mid-sequence: items 1 and 2
    // go through normally, item 3 finishes its stop-join-remove, 4 and 5
    // survive.
    h.tool.clear_flag_on_cancel(&url(3), h.engine.bulk_handle());
    assert_eq!(h.engine.remove_all(), 3);

    assert_eq!(h.engine.table().len(), 2);
    assert_eq!(h.engine.table().ordinals(), vec![1, 2]);
    let remaining: Vec<String> = h
        .engine
        .table()
        .items()
        .map(|i| i.url().to_string())
        .collect();
    assert_eq!(remaining, vec![url(4), url(5)]);

    // The scheduler resumes afterwards: the freed slots are refilled.
    h.pump_until(|e| e.stats().downloading == 2);
    h.engine.shutdown();
}

#[test]
fn remove_all_leaves_no_workers_behind() {
    let mut h = Harness::new(3);
    h.add_many(3);
    h.pump_until(|e| e.stats().downloading == 3);

    assert_eq!(h.engine.remove_all(), 3);
    assert!(h.engine.table().is_empty());
    // Events from removed items are discarded, not misapplied.
    h.engine.drain_events();
    assert!(h.engine.table().is_empty());
}

#[test]
fn stopped_item_competes_for_autostart_again() {
    let mut h = Harness::new(1);
    h.engine.set_autostart(false);
    h.add_many(2);
    h.pump_until(|e| e.stats().ready == 2);
    h.engine.set_autostart(true);
    assert!(matches!(h.status(1), DownloadStatus::Downloading));

    h.engine.stop_item(&url(1)).unwrap();
    assert!(matches!(h.status(1), DownloadStatus::Stopped));
    h.pump_until(|e| {
        !e.item(&url(1))
            .unwrap()
            .workers
            .is_running(vidqueue_core::WorkerKind::Download)
    });

    // A scheduler nudge picks the stopped item again; it is still first in
    // visual order and stopped items stay eligible.
    h.engine.set_autostart(true);
    assert!(matches!(h.status(1), DownloadStatus::Downloading));
    h.tool.finish_download(&url(1));
    h.tool.finish_download(&url(2));
    h.pump_until(|e| e.stats().done == 2);
}

#[test]
fn duplicate_url_is_rejected_without_side_effects() {
    let mut h = Harness::new(1);
    h.engine.set_autostart(false);
    h.add_many(2);
    h.pump_until(|e| e.stats().ready == 2);

    assert!(matches!(
        h.engine.add_url(&url(1)),
        Err(Error::DuplicateUrl(_))
    ));
    assert_eq!(h.engine.table().len(), 2);
    assert_eq!(h.engine.table().ordinals(), vec![1, 2]);
}
