//! Event-stream handler for live reload.
//!
//! Each request to the reload port becomes a long-lived response body fed
//! by a [`ReloadClient`] channel plus a per-connection heartbeat.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::event::ReloadEvent;
use super::hub::{NotificationHub, ReloadClient};

/// Interval between heartbeat events on an idle connection.
pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Handle a reload connection.
///
/// The `connected` acknowledgment is queued before the client is
/// registered, so a broadcast can never overtake it.
pub(crate) async fn stream_handler(State(hub): State<Arc<NotificationHub>>) -> Response {
    let (client, rx) = ReloadClient::channel();
    client.send(ReloadEvent::Connected);
    hub.register(client);

    tracing::debug!(clients = hub.len(), "Reload client connected");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(event_stream(rx, HEARTBEAT_INTERVAL)))
        .unwrap()
}

/// Frames for one connection.
///
/// Hub events take priority over heartbeats. The stream ends once the hub
/// drops the client after a reload. Dropping the stream (the peer went
/// away) drops the heartbeat timer with it.
fn event_stream(
    rx: mpsc::UnboundedReceiver<ReloadEvent>,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    futures_util::stream::unfold((rx, ticker), next_frame)
}

async fn next_frame(
    (mut rx, mut ticker): (mpsc::UnboundedReceiver<ReloadEvent>, Interval),
) -> Option<(
    Result<Bytes, Infallible>,
    (mpsc::UnboundedReceiver<ReloadEvent>, Interval),
)> {
    let event = tokio::select! {
        biased;
        event = rx.recv() => event?,
        _ = ticker.tick() => ReloadEvent::Ping,
    };

    Some((Ok(event.to_frame()), (rx, ticker)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn frame(event: ReloadEvent) -> Bytes {
        event.to_frame()
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_precedes_heartbeat() {
        let (client, rx) = ReloadClient::channel();
        client.send(ReloadEvent::Connected);
        let mut stream = Box::pin(event_stream(rx, Duration::from_secs(60)));

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            frame(ReloadEvent::Connected)
        );

        let before = Instant::now();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            frame(ReloadEvent::Ping)
        );
        assert!(before.elapsed() >= Duration::from_secs(60));

        drop(client);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_repeats() {
        let (client, rx) = ReloadClient::channel();
        let mut stream = Box::pin(event_stream(rx, Duration::from_secs(60)));

        for _ in 0..3 {
            assert_eq!(
                stream.next().await.unwrap().unwrap(),
                frame(ReloadEvent::Ping)
            );
        }

        drop(client);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_after_reload() {
        let hub = NotificationHub::new();
        let (client, rx) = ReloadClient::channel();
        client.send(ReloadEvent::Connected);
        hub.register(client);
        let mut stream = Box::pin(event_stream(rx, Duration::from_secs(60)));

        assert_eq!(hub.broadcast(), 1);

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            frame(ReloadEvent::Connected)
        );
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            frame(ReloadEvent::Reload)
        );
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_stream_closes_client() {
        let (client, rx) = ReloadClient::channel();
        let stream = event_stream(rx, Duration::from_secs(60));

        drop(stream);

        assert!(!client.is_open());
    }
}
