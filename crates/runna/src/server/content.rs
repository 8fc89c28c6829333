//! Content server: files from the served root, with the reload client
//! injected into HTML pages and a file listing for anything missing.

use crate::listing;
use crate::server::assets::{StaticAssets, NOT_FOUND_TEMPLATE, RELOAD_SCRIPT, STATIC_FRAGMENT};
use crate::server::SharedState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Token in the not-found template replaced by the listing.
pub const LISTING_PLACEHOLDER: &str = "$DATA";

/// Page served for a request path ending in `/`.
const DIRECTORY_INDEX: &str = "index.html";

/// Extension of the documents that get the reload client.
const PAGE_EXTENSION: &str = "html";

/// Markup appended to every page and to the not-found document.
pub static INJECT_SNIPPET: LazyLock<String> = LazyLock::new(|| {
    format!(
        "\n<script src=\"/{}/{}\"></script>",
        STATIC_FRAGMENT, RELOAD_SCRIPT
    )
});

/// Append the reload client script tag to a document.
pub fn inject_reload_client(document: &str) -> String {
    let mut injected = String::with_capacity(document.len() + INJECT_SNIPPET.len());
    injected.push_str(document);
    injected.push_str(&INJECT_SNIPPET);
    injected
}

/// Map a request path onto the served root.
///
/// A trailing `/` selects `index.html`. Returns `None` when the path cannot
/// be decoded or would leave `root`: a `..` with nothing left to pop, or a
/// segment that is not a single plain path component.
pub fn resolve_request_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ if !is_plain_segment(segment) => return None,
            _ => segments.push(segment),
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(segments.iter());
    if decoded.ends_with('/') {
        resolved.push(DIRECTORY_INDEX);
    }

    resolved.starts_with(root).then_some(resolved)
}

/// A segment the platform reads as exactly one normal path component.
///
/// Backslashes are refused everywhere so that URLs behave the same on every
/// platform.
fn is_plain_segment(segment: &str) -> bool {
    if segment.contains(['\\', '\0']) {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Whether the resolved file gets the reload client injected.
pub fn is_page(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(PAGE_EXTENSION)
}

/// Serve a request from the served root.
///
/// Pages are read, injected and returned; other files are streamed as-is;
/// anything that is not a regular file under the root gets the listing.
pub async fn serve_content(State(state): State<SharedState>, request: Request) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return method_not_allowed();
    }

    let root = state.config().root.clone();
    let Some(path) = resolve_request_path(&root, request.uri().path()) else {
        tracing::debug!("Rejected path outside the served root: {}", request.uri().path());
        return not_found(root).await;
    };

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file || !is_contained(&root, &path).await {
        return not_found(root).await;
    }

    if is_page(&path) {
        serve_page(&path).await
    } else {
        serve_file(&path, request).await
    }
}

/// Whether `path` still lies under `root` once symlinks are resolved.
///
/// `root` is expected to be canonical already.
pub async fn is_contained(root: &Path, path: &Path) -> bool {
    match tokio::fs::canonicalize(path).await {
        Ok(real) if real.starts_with(root) => true,
        Ok(real) => {
            tracing::debug!(
                "Rejected {} resolving outside the served root to {}",
                path.display(),
                real.display()
            );
            false
        }
        Err(_) => false,
    }
}

/// Serve an HTML page with the reload client appended.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
async fn serve_page(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let document = String::from_utf8_lossy(&bytes);
            html_response(StatusCode::OK, inject_reload_client(&document))
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {}", path.display(), err);
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error: failed to read {}: {}", path.display(), err),
            )
        }
    }
}

async fn serve_file(path: &Path, request: Request) -> Response {
    let mime = mime_guess::from_path(path).first_or_text_plain();
    match ServeFile::new_with_mime(path, &mime).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Build the 404 document listing every page below `root`.
///
/// The listing is recomputed on every call.
pub async fn not_found(root: PathBuf) -> Response {
    let listing = tokio::task::spawn_blocking(move || listing::build_listing(&root))
        .await
        .unwrap_or_else(|err| {
            tracing::warn!("File listing task failed: {}", err);
            String::new()
        });

    render_not_found(StaticAssets::bytes(NOT_FOUND_TEMPLATE), &listing)
}

/// Fill the not-found template with `listing`.
///
/// A missing or non-UTF-8 template produces a plain-text 500 instead.
pub fn render_not_found(template: Option<Cow<'static, [u8]>>, listing: &str) -> Response {
    let Some(template) = template else {
        return text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: template {} is missing", NOT_FOUND_TEMPLATE),
        );
    };

    match std::str::from_utf8(&template) {
        Ok(template) => {
            let document = template.replace(LISTING_PLACEHOLDER, listing);
            html_response(StatusCode::NOT_FOUND, inject_reload_client(&document))
        }
        Err(err) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: template {} is unreadable: {}", NOT_FOUND_TEMPLATE, err),
        ),
    }
}

fn html_response(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}

fn text_response(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}

fn method_not_allowed() -> Response {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::ALLOW, "GET, HEAD")
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::METHOD_NOT_ALLOWED.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_appends_snippet_once() {
        let injected = inject_reload_client("<p>hi</p>");
        assert_eq!(
            injected,
            "<p>hi</p>\n<script src=\"/__static/reload.js\"></script>"
        );
    }

    #[test]
    fn test_resolve_plain_path() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve_request_path(root, "/css/app.css"),
            Some(PathBuf::from("/srv/site/css/app.css"))
        );
    }

    #[test]
    fn test_resolve_trailing_slash_appends_index() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve_request_path(root, "/"),
            Some(PathBuf::from("/srv/site/index.html"))
        );
        assert_eq!(
            resolve_request_path(root, "/docs/"),
            Some(PathBuf::from("/srv/site/docs/index.html"))
        );
    }

    #[test]
    fn test_resolve_decodes_percent_escapes() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve_request_path(root, "/my%20page.html"),
            Some(PathBuf::from("/srv/site/my page.html"))
        );
    }

    #[test]
    fn test_resolve_inner_parent_segments() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve_request_path(root, "/a/../b/./c.html"),
            Some(PathBuf::from("/srv/site/b/c.html"))
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve_request_path(root, "/../../etc/passwd"), None);
        assert_eq!(resolve_request_path(root, "/a/../../etc/passwd"), None);
        assert_eq!(resolve_request_path(root, "/%2e%2e/etc/passwd"), None);
        assert_eq!(resolve_request_path(root, "/..%2f..%2fetc/passwd"), None);
        assert_eq!(resolve_request_path(root, "/..%5c..%5cetc"), None);
        assert_eq!(resolve_request_path(root, "/a%00.html"), None);
    }

    #[test]
    fn test_resolve_rejects_invalid_utf8() {
        assert_eq!(resolve_request_path(Path::new("/srv"), "/%ff.html"), None);
    }

    #[tokio::test]
    async fn test_serve_page_replaces_invalid_utf8() {
        let temp = tempfile::TempDir::new().unwrap();
        let page = temp.path().join("caf.html");
        std::fs::write(&page, b"caf\xe9").unwrap();

        let response = serve_page(&page).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.starts_with("caf\u{FFFD}"));
        assert!(body.ends_with(INJECT_SNIPPET.as_str()));
    }

    #[tokio::test]
    async fn test_serve_page_read_failure_is_plain_text_500() {
        let temp = tempfile::TempDir::new().unwrap();
        let response = serve_page(&temp.path().join("vanished.html")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_is_contained() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        std::fs::write(root.join("inside.txt"), "ok").unwrap();

        assert!(is_contained(&root, &root.join("inside.txt")).await);
        assert!(!is_contained(&root, &root.join("missing.txt")).await);
        assert!(!is_contained(&root.join("sub"), &root.join("inside.txt")).await);
    }

    #[test]
    fn test_is_page() {
        assert!(is_page(Path::new("index.html")));
        assert!(!is_page(Path::new("index.htm")));
        assert!(!is_page(Path::new("app.css")));
        assert!(!is_page(Path::new("README")));
    }

    #[test]
    fn test_render_not_found_fills_template() {
        let template = Cow::Borrowed(b"<nav>$DATA</nav>".as_slice());
        let response = render_not_found(Some(template), "<a href=\"/x.html\">x.html</a>");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_render_not_found_without_template() {
        let response = render_not_found(None, "");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_render_not_found_with_binary_template() {
        let template = Cow::Borrowed([0xff, 0xfe, 0x00].as_slice());
        let response = render_not_found(Some(template), "");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
