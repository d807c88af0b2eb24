//! Filesystem monitor driving catalog rebuilds.
//!
//! One non-recursive OS watch per launcher root. Watch events are
//! forwarded over a channel into a background thread that debounces
//! bursts and then runs `rebuild_and_publish` on the shared catalog.

use crate::catalog::AppCatalog;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Debounce delay used by [`CatalogMonitor::start_default`]. Long
/// enough to coalesce a package install writing many files.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Monitor lifecycle states.
///
/// `Watching -> Debouncing -> Rebuilding -> Watching` on filesystem
/// activity; `Stopped` from anywhere on [`CatalogMonitor::stop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Watching,
    Debouncing,
    Rebuilding,
    Stopped,
}

enum Signal {
    Fs(String),
    Stop,
}

/// Watches the catalog's roots and republishes on changes.
pub struct CatalogMonitor {
    tx: Sender<Signal>,
    stopped: AtomicBool,
    state: Arc<Mutex<MonitorState>>,
    // Dropping the watcher releases the OS watches.
    watcher: Mutex<Option<RecommendedWatcher>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl CatalogMonitor {
    /// Start watching `catalog`'s roots with the given debounce delay.
    ///
    /// A root that cannot be watched is logged and skipped; with zero
    /// watchable roots the monitor stays in `Watching` and simply
    /// never fires.
    pub fn start(catalog: Arc<AppCatalog>, debounce: Duration) -> Self {
        let (tx, rx) = unbounded();
        let state = Arc::new(Mutex::new(MonitorState::Idle));

        let event_tx = tx.clone();
        let mut watcher = match notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) if is_mutation(&event.kind) => {
                    let _ = event_tx.send(Signal::Fs(describe_event(&event)));
                }
                Ok(_) => {}
                Err(err) => warn!("Watch error: {}", err),
            }
        }) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!("Could not create filesystem watcher: {}", err);
                None
            }
        };

        if let Some(watcher) = watcher.as_mut() {
            let mut watched = 0usize;
            for root in catalog.roots() {
                match watcher.watch(root, RecursiveMode::NonRecursive) {
                    Ok(()) => watched += 1,
                    Err(err) => warn!("Could not watch {:?}: {}", root, err),
                }
            }
            if watched == 0 {
                warn!("No launcher roots could be watched; catalog will not auto-refresh");
            }
        }

        let thread_state = state.clone();
        let thread = std::thread::spawn(move || run_loop(catalog, rx, debounce, thread_state));

        Self {
            tx,
            stopped: AtomicBool::new(false),
            state,
            watcher: Mutex::new(watcher),
            thread: Mutex::new(Some(thread)),
        }
    }

    /// [`CatalogMonitor::start`] with [`DEFAULT_DEBOUNCE`].
    pub fn start_default(catalog: Arc<AppCatalog>) -> Self {
        Self::start(catalog, DEFAULT_DEBOUNCE)
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock().unwrap()
    }

    /// Stop watching. Idempotent; a second call is a no-op.
    ///
    /// A pending debounce is cancelled. A rebuild already in flight
    /// runs to completion and publishes before the stop takes effect.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        // Release the OS watches first so no more events queue up.
        *self.watcher.lock().unwrap() = None;
        let _ = self.tx.send(Signal::Stop);

        if let Some(thread) = self.thread.lock().unwrap().take() {
            let _ = thread.join();
        }
        debug!("Catalog monitor stopped");
    }
}

impl Drop for CatalogMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    catalog: Arc<AppCatalog>,
    rx: Receiver<Signal>,
    debounce: Duration,
    state: Arc<Mutex<MonitorState>>,
) {
    set_state(&state, MonitorState::Watching);
    loop {
        match rx.recv() {
            Ok(Signal::Fs(mut reason)) => {
                set_state(&state, MonitorState::Debouncing);
                // Each further event re-arms the delay; the rebuild
                // waits for the burst to go quiet.
                loop {
                    match rx.recv_timeout(debounce) {
                        Ok(Signal::Fs(next)) => reason = next,
                        Ok(Signal::Stop) => {
                            set_state(&state, MonitorState::Stopped);
                            return;
                        }
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            set_state(&state, MonitorState::Stopped);
                            return;
                        }
                    }
                }

                set_state(&state, MonitorState::Rebuilding);
                catalog.rebuild_and_publish(&reason);
                set_state(&state, MonitorState::Watching);
            }
            Ok(Signal::Stop) | Err(_) => {
                set_state(&state, MonitorState::Stopped);
                return;
            }
        }
    }
}

fn set_state(state: &Mutex<MonitorState>, next: MonitorState) {
    *state.lock().unwrap() = next;
}

fn is_mutation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn describe_event(event: &Event) -> String {
    let path = event
        .paths
        .first()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown path>".to_string());
    let verb = match event.kind {
        EventKind::Create(_) => "created",
        EventKind::Remove(_) => "removed",
        EventKind::Modify(_) => "changed",
        _ => "touched",
    };
    format!("{path} {verb}")
}
