//! Recursive change watcher.
//!
//! Turns raw `notify` events into payload-free change notifications. The
//! consumer only ever reloads the whole page, so which file changed is
//! irrelevant.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::ServerError;

/// Capacity of the channel between the `notify` thread and the async side.
const CHANNEL_CAPACITY: usize = 100;

/// Watches a directory tree for changes.
///
/// Dropping the watcher stops the underlying OS watch and ends its
/// [`ChangeEvents`] sequence.
pub(crate) struct ChangeWatcher {
    target: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ChangeWatcher {
    /// Start watching `dir` recursively.
    ///
    /// Subdirectories created later are picked up as well.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidWatchTarget`] if `dir` does not exist or
    /// is not a directory, and [`ServerError::Watch`] if the OS watch cannot be
    /// installed.
    pub(crate) fn watch(dir: &Path) -> Result<(Self, ChangeEvents), ServerError> {
        let target = std::fs::canonicalize(dir)
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| ServerError::InvalidWatchTarget(dir.to_path_buf()))?;

        let (tx, rx) = mpsc::channel::<()>(CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) if is_change(&event.kind) => {
                    // Use blocking_send since callback is sync
                    let _ = tx.blocking_send(());
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "File watcher error"),
            }
        })?;

        watcher.watch(&target, RecursiveMode::Recursive)?;
        tracing::debug!(path = %target.display(), "Watching for changes");

        Ok((
            Self {
                target,
                _watcher: watcher,
            },
            ChangeEvents { rx },
        ))
    }

    /// Absolute path of the watched directory.
    pub(crate) fn target(&self) -> &Path {
        &self.target
    }
}

/// Whether a `notify` event kind is a content or structure change.
///
/// Access events are ignored: on Linux every write is followed by a
/// close-write access event, which would double every notification.
fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Sequence of change notifications from a [`ChangeWatcher`].
pub(crate) struct ChangeEvents {
    rx: mpsc::Receiver<()>,
}

impl ChangeEvents {
    #[cfg(test)]
    pub(crate) fn from_receiver(rx: mpsc::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the watcher has been dropped.
    pub(crate) async fn next(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Wait for the next batch of changes.
    ///
    /// With a zero window every change is its own batch. Otherwise further
    /// changes are absorbed until none has arrived for `window`.
    pub(crate) async fn next_batch(&mut self, window: Duration) -> Option<()> {
        self.next().await?;

        if !window.is_zero() {
            while let Ok(Some(())) = tokio::time::timeout(window, self.rx.recv()).await {}
        }

        Some(())
    }
}
