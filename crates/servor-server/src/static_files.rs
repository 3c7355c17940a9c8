//! Static file serving.
//!
//! Resolves request paths against the root directory. Paths whose last
//! segment has no extension are client-side routes and get the fallback
//! document instead: `/` with 200, anything else with 301 and the same
//! body. When live reload is on, the reload snippet is appended to every
//! fallback response.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::Response;
use percent_encoding::percent_decode_str;

use crate::state::AppState;

/// Create router for static file serving with route fallback.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new().fallback(serve_file)
}

/// Whether a path names a client-side route rather than a file.
fn is_route_request(pathname: &str) -> bool {
    let last_segment = pathname.rsplit('/').next().unwrap_or_default();
    !last_segment.contains('.')
}

/// Bytes whose escapes stay encoded when decoding a path; they are URI
/// syntax, not file name characters.
const RESERVED: &[u8] = b";/?:@&=+$,#";

/// Percent-decode a request path, keeping escapes of [`RESERVED`] bytes.
///
/// Invalid UTF-8 after decoding becomes U+FFFD.
fn decode_path(pathname: &str) -> String {
    let mut decoded = Vec::with_capacity(pathname.len());
    let mut rest = pathname;

    while let Some(pos) = find_reserved_escape(rest) {
        decoded.extend(percent_decode_str(&rest[..pos]));
        decoded.extend_from_slice(&rest.as_bytes()[pos..pos + 3]);
        rest = &rest[pos + 3..];
    }
    decoded.extend(percent_decode_str(rest));

    String::from_utf8_lossy(&decoded).into_owned()
}

fn find_reserved_escape(s: &str) -> Option<usize> {
    s.match_indices('%').map(|(i, _)| i).find(|&i| {
        s.get(i + 1..i + 3)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .is_some_and(|byte| RESERVED.contains(&byte))
    })
}

/// Join a decoded resource path onto the root.
///
/// Returns `None` for paths that would leave the root.
fn resolve(root_dir: &Path, resource: &str) -> Option<PathBuf> {
    let relative = Path::new(resource.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    (!escapes).then(|| root_dir.join(relative))
}

/// Serve a file from the root directory, or the fallback for routes.
async fn serve_file(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let pathname = uri.path();
    let is_route = is_route_request(pathname);
    let status = if is_route && pathname != "/" {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::OK
    };
    let resource = if is_route {
        format!("/{}", state.fallback)
    } else {
        decode_path(pathname)
    };

    if is_route {
        tracing::debug!(path = pathname, "Route request");
    }

    let Some(file_path) = resolve(&state.root_dir, &resource) else {
        return send_error(&resource, StatusCode::NOT_FOUND);
    };

    if tokio::fs::metadata(&file_path).await.is_err() {
        return send_error(&resource, StatusCode::NOT_FOUND);
    }

    let mut contents = match tokio::fs::read(&file_path).await {
        Ok(contents) => contents,
        Err(err) => {
            tracing::debug!(path = %file_path.display(), error = %err, "Read failed");
            return send_error(&resource, StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if is_route && let Some(script) = &state.reload_script {
        contents.extend_from_slice(script.as_bytes());
    }

    let content_type = state.mime.content_type_for(&resource);
    send_file(&resource, status, content_type, contents)
}

fn send_error(resource: &str, status: StatusCode) -> Response {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), resource, "Request failed");
    } else {
        tracing::warn!(status = status.as_u16(), resource, "Request failed");
    }

    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap()
}

fn send_file(resource: &str, status: StatusCode, content_type: &str, contents: Vec<u8>) -> Response {
    tracing::info!(status = status.as_u16(), resource, "Served");

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(contents))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_reload;
    use axum::body::to_bytes;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Root with `index.html` and `style.css`.
    fn fixture() -> TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<p>hi</p>").unwrap();
        std::fs::write(temp_dir.path().join("style.css"), "body{}").unwrap();
        temp_dir
    }

    fn router(root: &Path, reload_port: Option<u16>) -> Router {
        let state = AppState::new(root.to_path_buf(), "index.html".to_owned(), reload_port);
        static_router().with_state(Arc::new(state))
    }

    async fn get(app: Router, path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[test]
    fn test_is_route_request() {
        assert!(is_route_request("/"));
        assert!(is_route_request("/about"));
        assert!(is_route_request("/users/42"));
        assert!(is_route_request("/v1.2/settings"));
        assert!(is_route_request("/docs/"));
        assert!(!is_route_request("/style.css"));
        assert!(!is_route_request("/assets/app.min.js"));
    }

    #[test]
    fn test_resolve_stays_inside_root() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve(root, "/css/site.css"),
            Some(PathBuf::from("/srv/site/css/site.css"))
        );
        assert_eq!(
            resolve(root, "//index.html"),
            Some(PathBuf::from("/srv/site/index.html"))
        );
        assert_eq!(resolve(root, "/../secret.txt"), None);
        assert_eq!(resolve(root, "/a/../../secret.txt"), None);
    }

    #[test]
    fn test_decode_path_keeps_reserved_escapes() {
        assert_eq!(decode_path("/my%20file.txt"), "/my file.txt");
        assert_eq!(decode_path("/a%2Fb.css"), "/a%2Fb.css");
        assert_eq!(decode_path("/a%2fb%3F%23.css"), "/a%2fb%3F%23.css");
        assert_eq!(decode_path("/caf%C3%A9%2B.txt"), "/café%2B.txt");
        assert_eq!(decode_path("/%%2F%zz"), "/%%2F%zz");
        assert_eq!(decode_path("/bad%FF.txt"), "/bad\u{FFFD}.txt");
    }

    #[tokio::test]
    async fn test_encoded_slash_does_not_reach_subdirectory() {
        let root = fixture();
        std::fs::create_dir(root.path().join("a")).unwrap();
        std::fs::write(root.path().join("a/b.css"), "nested").unwrap();

        let (status, _, body) = get(router(root.path(), None), "/a%2Fb.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, _, body) = get(router(root.path(), None), "/a/b.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"nested");
    }

    #[tokio::test]
    async fn test_root_serves_fallback_with_200() {
        let root = fixture();
        let (status, content_type, body) = get(router(root.path(), None), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_route_serves_fallback_with_301_and_script() {
        let root = fixture();
        let (status, content_type, body) = get(router(root.path(), Some(5000)), "/about").await;

        let expected = format!("<p>hi</p>{}", live_reload::reload_script(5000));
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_root_gets_script_when_reload_enabled() {
        let root = fixture();
        let (status, _, body) = get(router(root.path(), Some(5000)), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().ends_with(&live_reload::reload_script(5000)));
    }

    #[tokio::test]
    async fn test_route_without_reload_has_no_script() {
        let root = fixture();
        let (status, _, body) = get(router(root.path(), None), "/about").await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(body, b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_existing_file_served_unmodified() {
        let root = fixture();
        let (status, content_type, body) = get(router(root.path(), Some(5000)), "/style.css").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/css"));
        assert_eq!(body, b"body{}");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_empty_body() {
        let root = fixture();
        let (status, content_type, body) = get(router(root.path(), Some(5000)), "/missing.png").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type, None);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fallback_is_404() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (status, _, body) = get(router(temp_dir.path(), None), "/about").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_resource_is_500() {
        let root = fixture();
        std::fs::create_dir(root.path().join("bundle.d")).unwrap();
        let (status, _, body) = get(router(root.path(), None), "/bundle.d").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_percent_encoded_path_is_decoded() {
        let root = fixture();
        std::fs::write(root.path().join("my file.txt"), "spaced").unwrap();
        let (status, content_type, body) = get(router(root.path(), None), "/my%20file.txt").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert_eq!(body, b"spaced");
    }

    #[tokio::test]
    async fn test_nested_file_and_unknown_type() {
        let root = fixture();
        std::fs::create_dir(root.path().join("data")).unwrap();
        std::fs::write(root.path().join("data/blob.xyz"), [0u8, 1, 2]).unwrap();
        let (status, content_type, body) = get(router(root.path(), None), "/data/blob.xyz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(body, vec![0u8, 1, 2]);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let root = fixture();
        let app = router(root.path(), Some(5000));

        let first = get(app.clone(), "/about").await;
        let second = get(app, "/about").await;

        assert_eq!(first, second);
    }
}
