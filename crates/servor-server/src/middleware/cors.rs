//! Cross-origin header middleware.
//!
//! Both listeners answer every response with
//! `Access-Control-Allow-Origin: *` so pages served from any origin can
//! load resources and open the reload stream.

use axum::http::HeaderValue;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use tower_http::set_header::SetResponseHeaderLayer;

/// Create layer that adds a wildcard Access-Control-Allow-Origin header.
pub(crate) fn allow_any_origin_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))
}
