//! Bundled support files served under the static fragment.

use crate::server::{content, SharedState};
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::borrow::Cow;

/// URL prefix of the bundled files.
pub const STATIC_FRAGMENT: &str = "__static";

/// Name of the reload client script inside the bundle.
pub const RELOAD_SCRIPT: &str = "reload.js";

/// Name of the not-found template inside the bundle.
pub const NOT_FOUND_TEMPLATE: &str = "index.html";

/// Token in the reload script replaced by the reload channel port.
pub const RELOAD_PORT_PLACEHOLDER: &str = "{{RELOAD_PORT}}";

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct StaticAssets;

impl StaticAssets {
    /// Raw bytes of a bundled file.
    pub fn bytes(name: &str) -> Option<Cow<'static, [u8]>> {
        Self::get(name).map(|file| file.data)
    }
}

/// Serve a bundled file, or hand the request to the content server when
/// the bundle has no such file.
pub async fn serve_static_asset(
    State(state): State<SharedState>,
    Path(asset_path): Path<String>,
    request: Request,
) -> Response {
    let Some(data) = StaticAssets::bytes(&asset_path) else {
        return content::serve_content(State(state), request).await;
    };

    let body = if asset_path == RELOAD_SCRIPT {
        Body::from(render_reload_script(&data, state.reload_port()))
    } else {
        Body::from(data)
    };

    let content_type = mime_guess::from_path(&asset_path).first_or_text_plain();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Fill the reload channel port into the bundled reload script.
pub fn render_reload_script(script: &[u8], reload_port: u16) -> String {
    String::from_utf8_lossy(script).replace(RELOAD_PORT_PLACEHOLDER, &reload_port.to_string())
}
