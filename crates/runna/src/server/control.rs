//! Control endpoints: routes that trigger side effects instead of serving
//! content.

use crate::server::SharedState;
use crate::ui;
use axum::{extract::State, http::StatusCode};

/// Path of the reload trigger.
pub const RELOAD_ROUTE: &str = "/+reload";

/// Path of the exit trigger.
pub const EXIT_ROUTE: &str = "/+exit";

/// Answer with an empty body, then push `reload` to every open browser.
///
/// The broadcast runs on a separate task once the handler has returned.
pub async fn trigger_reload(State(state): State<SharedState>) -> StatusCode {
    ui::info("Reloading.");
    let channel = state.reload_channel();
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        let notified = channel.broadcast();
        tracing::debug!("Reload sent to {} client(s)", notified);
    });
    StatusCode::OK
}

/// Answer with an empty body, then shut the process down.
///
/// The hook runs on a separate task after the handler returns. Nothing
/// waits for other in-flight requests, and the response itself may be cut
/// off; the remote exit client treats that as success.
pub async fn trigger_exit(State(state): State<SharedState>) -> StatusCode {
    ui::info("Shutting down.");
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        state.request_exit();
    });
    StatusCode::OK
}
