//! Live reload subsystem.
//!
//! ```text
//! notify ──► ChangeWatcher ──► LiveReloadManager ──► NotificationHub
//!                                                        ▲      │
//!                          reload port ── stream_handler ┘      ▼
//!                                                   event stream per browser tab
//! ```

mod event;
mod hub;
mod manager;
mod stream;
mod watcher;

pub(crate) use hub::NotificationHub;
pub(crate) use manager::LiveReloadManager;
pub(crate) use stream::stream_handler;

/// Client snippet appended to fallback documents.
///
/// Opens an event stream to the reload port on the page's own host and
/// reloads the page on any `message` event.
pub(crate) fn reload_script(reload_port: u16) -> String {
    format!(
        "\n  <script>\n    \
         const source = new EventSource('https://'+location.hostname+':{reload_port}');\n    \
         source.onmessage = e => location.reload(true);\n  \
         </script>\n"
    )
}
