//! Live reload manager.
//!
//! Coordinates file watching and broadcasting to reload clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use super::hub::NotificationHub;
use super::watcher::{ChangeEvents, ChangeWatcher};
use crate::error::ServerError;

/// Manages the change watcher and the clients it notifies.
pub(crate) struct LiveReloadManager {
    root_dir: PathBuf,
    hub: Arc<NotificationHub>,
    debounce: Duration,
    watcher: Option<ChangeWatcher>,
    task: Option<JoinHandle<()>>,
}

impl LiveReloadManager {
    /// Create a new live reload manager.
    ///
    /// # Arguments
    ///
    /// * `root_dir` - Directory to watch for changes
    /// * `debounce_ms` - Quiet window for coalescing bursts (0 broadcasts every change)
    #[must_use]
    pub(crate) fn new(root_dir: PathBuf, debounce_ms: u64) -> Self {
        Self {
            root_dir,
            hub: Arc::new(NotificationHub::new()),
            debounce: Duration::from_millis(debounce_ms),
            watcher: None,
            task: None,
        }
    }

    /// Start the file watcher.
    ///
    /// Spawns a background task that broadcasts a reload to every connected
    /// client once per change (or per batch when debouncing).
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory is not a directory or the
    /// file watcher cannot be created.
    pub(crate) fn start(&mut self) -> Result<(), ServerError> {
        let (watcher, events) = ChangeWatcher::watch(&self.root_dir)?;
        tracing::info!(path = %watcher.target().display(), "Live reload watching");

        self.task = Some(tokio::spawn(Self::broadcast_changes(
            events,
            Arc::clone(&self.hub),
            self.debounce,
        )));
        self.watcher = Some(watcher);

        Ok(())
    }

    /// Broadcast a reload for every change until the watcher goes away.
    async fn broadcast_changes(
        mut events: ChangeEvents,
        hub: Arc<NotificationHub>,
        debounce: Duration,
    ) {
        while events.next_batch(debounce).await.is_some() {
            let start = Instant::now();
            let clients = hub.broadcast();

            tracing::info!(
                clients,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Live reload event processed"
            );
        }
    }

    /// Hub shared with the reload channel server.
    #[must_use]
    pub(crate) fn hub(&self) -> Arc<NotificationHub> {
        Arc::clone(&self.hub)
    }

    /// Watched directory (absolute once started).
    pub(crate) fn root_dir(&self) -> &Path {
        self.watcher
            .as_ref()
            .map_or(self.root_dir.as_path(), ChangeWatcher::target)
    }
}

impl Drop for LiveReloadManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
