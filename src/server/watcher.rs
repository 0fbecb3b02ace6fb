//! Project directory watcher
//!
//! Watches the project root recursively (the dedicated `.LiveSpec`
//! subdirectory included) and classifies each settled change by file role.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   notify    │────>│  debouncer  │────>│ watch thread │────>│ WatchEvent  │
//! │   watcher   │     │  (100ms)    │     │ (poll 50ms)  │     │  (tokio rx) │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! Only one watch session is live at a time; starting a new one stops the
//! previous session and joins its thread first.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::WatcherSettings;
use crate::error::{LiveSpecError, Result};
use crate::graph::is_graph_file;
use crate::paths::DEDICATED_DIR_NAME;

/// Configuration for the project watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration (default: 100ms)
    pub debounce_duration: Duration,
    /// How long the event thread waits for a batch before re-checking shutdown
    pub poll_interval: Duration,
    /// Directory names never reported
    pub ignored_dirs: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self::from(&WatcherSettings::default())
    }
}

impl From<&WatcherSettings> for WatcherConfig {
    fn from(settings: &WatcherSettings) -> Self {
        Self {
            debounce_duration: settings.debounce(),
            poll_interval: settings.poll_interval(),
            ignored_dirs: settings.ignored_dirs.clone(),
        }
    }
}

/// Whether a changed path still exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Removed,
}

/// A classified change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// An HTML page changed; bridges should reload
    FileChanged { path: PathBuf, kind: ChangeKind },
    /// The graph file changed; it must be re-read
    GraphChanged { path: PathBuf, kind: ChangeKind },
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::FileChanged { path, .. } | Self::GraphChanged { path, .. } => path,
        }
    }
}

/// Classify a path by role. Anything other than HTML pages and the graph
/// file yields `None`.
pub fn classify(path: &Path, kind: ChangeKind) -> Option<WatchEvent> {
    if is_graph_file(path) {
        return Some(WatchEvent::GraphChanged {
            path: path.to_path_buf(),
            kind,
        });
    }
    let is_html = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("html"))
        .unwrap_or(false);
    if is_html {
        return Some(WatchEvent::FileChanged {
            path: path.to_path_buf(),
            kind,
        });
    }
    None
}

/// Check if a path should be reported.
///
/// Components are checked relative to `root`, so a project living under a
/// dotted directory is still watched. Dotted names are skipped except the
/// dedicated subdirectory.
pub fn should_watch_path(path: &Path, root: &Path, ignored_dirs: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    for component in relative.components() {
        if let Component::Normal(name) = component {
            let name = name.to_string_lossy();
            if name == DEDICATED_DIR_NAME {
                continue;
            }
            if name.starts_with('.') {
                return false;
            }
            if ignored_dirs.iter().any(|ignored| *ignored == name) {
                return false;
            }
        }
    }
    true
}

struct WatchSession {
    root: PathBuf,
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Owned directory watcher; at most one active session
pub struct ProjectWatcher {
    config: WatcherConfig,
    session: Mutex<Option<WatchSession>>,
}

impl ProjectWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Root of the active session
    pub fn root(&self) -> Option<PathBuf> {
        self.session.lock().as_ref().map(|s| s.root.clone())
    }

    /// Start watching `root`, stopping any active session first.
    ///
    /// Classified events arrive on the returned receiver until `stop` is
    /// called or the receiver is dropped.
    pub fn start(&self, root: &Path) -> Result<mpsc::UnboundedReceiver<WatchEvent>> {
        self.stop();

        let watcher_err = |e: notify::Error| LiveSpecError::Watcher {
            message: e.to_string(),
        };

        let (raw_tx, raw_rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(self.config.debounce_duration, raw_tx).map_err(watcher_err)?;
        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(watcher_err)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let thread_root = root.to_path_buf();
        let ignored_dirs = self.config.ignored_dirs.clone();
        let poll_interval = self.config.poll_interval;

        let thread = std::thread::Builder::new()
            .name("livespec-watcher".to_string())
            .spawn(move || {
                while thread_running.load(Ordering::SeqCst) {
                    match raw_rx.recv_timeout(poll_interval) {
                        Ok(Ok(events)) => {
                            tracing::debug!("[WATCHER] Received {} raw events", events.len());
                            let mut seen = HashSet::new();
                            for event in events {
                                if !matches!(event.kind, DebouncedEventKind::Any) {
                                    continue;
                                }
                                if !seen.insert(event.path.clone()) {
                                    continue;
                                }
                                if !should_watch_path(&event.path, &thread_root, &ignored_dirs) {
                                    tracing::trace!("[WATCHER] Filtered out: {:?}", event.path);
                                    continue;
                                }
                                let kind = if event.path.exists() {
                                    ChangeKind::Modified
                                } else {
                                    ChangeKind::Removed
                                };
                                let Some(classified) = classify(&event.path, kind) else {
                                    continue;
                                };
                                tracing::info!("[WATCHER] {:?}", classified);
                                if event_tx.send(classified).is_err() {
                                    tracing::debug!("[WATCHER] Receiver dropped, exiting");
                                    return;
                                }
                            }
                        }
                        Ok(Err(e)) => {
                            tracing::error!("[WATCHER] Watch error: {:?}", e);
                        }
                        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }

                // Keep debouncer alive until thread exits
                drop(debouncer);
            })
            .map_err(|e| LiveSpecError::Watcher {
                message: format!("failed to spawn watcher thread: {}", e),
            })?;

        *self.session.lock() = Some(WatchSession {
            root: root.to_path_buf(),
            running,
            thread,
        });
        tracing::info!("[WATCHER] Watching {}", root.display());
        Ok(event_rx)
    }

    /// Stop the active session, if any, and wait for its thread to exit.
    ///
    /// Blocks the calling thread for up to one poll interval; async callers
    /// use [`ProjectWatcher::shutdown`].
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().take() {
            session.join();
        }
    }

    /// Stop the active session, joining its thread on the blocking pool
    pub async fn shutdown(&self) {
        let Some(session) = self.session.lock().take() else {
            return;
        };
        if let Err(e) = tokio::task::spawn_blocking(move || session.join()).await {
            tracing::warn!("[WATCHER] Join task failed: {}", e);
        }
    }
}

impl WatchSession {
    fn join(self) {
        self.running.store(false, Ordering::SeqCst);
        if self.thread.join().is_err() {
            tracing::warn!("[WATCHER] Watcher thread panicked");
        }
        tracing::info!("[WATCHER] Stopped watching {}", self.root.display());
    }
}

impl Default for ProjectWatcher {
    fn default() -> Self {
        Self::new(WatcherConfig::default())
    }
}

impl Drop for ProjectWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
