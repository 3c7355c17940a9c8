//! Application state.
//!
//! Shared state for static file requests.

use std::path::PathBuf;

use crate::live_reload;
use crate::mime::MimeTable;

/// State shared across all static file handlers.
pub(crate) struct AppState {
    /// Directory resources are resolved against.
    pub(crate) root_dir: PathBuf,
    /// Document served for route requests.
    pub(crate) fallback: String,
    /// Extension to content-type table.
    pub(crate) mime: MimeTable,
    /// Snippet appended to fallback documents (if live reload is enabled).
    pub(crate) reload_script: Option<String>,
}

impl AppState {
    pub(crate) fn new(
        root_dir: PathBuf,
        fallback: String,
        live_reload_port: Option<u16>,
    ) -> Self {
        Self {
            root_dir,
            fallback,
            mime: MimeTable::builtin(),
            reload_script: live_reload_port.map(live_reload::reload_script),
        }
    }

    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.reload_script.is_some()
    }
}
