//! Event-stream framing for the reload channel.
//!
//! Every frame is an event line, a constant id line, a data line and a
//! blank line that terminates the event:
//!
//! ```text
//! event: connected
//! id: 0
//! data: ready
//!
//! ```

use axum::body::Bytes;

/// Event sent over a reload connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReloadEvent {
    /// Initial acknowledgment, sent once per connection.
    Connected,
    /// Heartbeat that keeps idle connections from timing out.
    Ping,
    /// Files changed; the client should reload.
    Reload,
}

impl ReloadEvent {
    /// Event name as seen by `EventSource` listeners.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Ping => "ping",
            // `EventSource.onmessage` only fires for the default event name
            Self::Reload => "message",
        }
    }

    /// Event payload.
    pub(crate) fn data(self) -> &'static str {
        match self {
            Self::Connected => "ready",
            Self::Ping => "waiting",
            Self::Reload => "reloading",
        }
    }

    /// Encode the event as a wire frame.
    pub(crate) fn to_frame(self) -> Bytes {
        Bytes::from(encode_frame(self.name(), self.data()))
    }
}

/// Serialize one event-stream frame.
///
/// The id is always `0`: clients never resume, they reload.
pub(crate) fn encode_frame(event: &str, data: &str) -> String {
    format!("event: {event}\nid: 0\ndata: {data}\n\n")
}
