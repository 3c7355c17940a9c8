//! Router construction.
//!
//! Builds the routers for the main (static file) and reload listeners.

use std::sync::Arc;

use axum::Router;

use crate::live_reload::{self, NotificationHub};
use crate::middleware::cors;
use crate::state::AppState;
use crate::static_files;

/// Create the static file router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    static_files::static_router()
        .layer(cors::allow_any_origin_layer())
        .with_state(state)
}

/// Create the reload channel router.
///
/// Every method and path opens an event stream.
pub(crate) fn create_reload_router(hub: Arc<NotificationHub>) -> Router {
    Router::new()
        .fallback(live_reload::stream_handler)
        .layer(cors::allow_any_origin_layer())
        .with_state(hub)
}
