//! WebSocket endpoint of the reload channel.

use crate::reload::{ConnectionState, ReloadChannel};
use crate::server::SharedState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;

/// Upgrade any request on the reload port to a reload connection.
pub async fn reload_socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let channel = state.reload_channel();
    ws.on_upgrade(move |socket| handle_reload_socket(socket, channel))
}

async fn handle_reload_socket(socket: WebSocket, channel: Arc<ReloadChannel>) {
    let (sender, receiver) = socket.split();
    serve_reload_client(channel, sender, receiver).await;
}

/// Drive one reload connection until either side goes away.
///
/// Forwards reload tokens from the registry to `sink`, answers pings, and
/// leaves the registry when the browser closes the socket or a write fails.
pub async fn serve_reload_client<S, R, E>(channel: Arc<ReloadChannel>, mut sink: S, mut stream: R)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (id, mut signals) = channel.register();
    channel.set_state(id, ConnectionState::Open);
    tracing::debug!("Reload client {} connected", id);

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    channel.set_state(id, ConnectionState::Closing);
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!("Reload client {} errored: {}", id, err);
                    break;
                }
            },
        }
    }

    channel.set_state(id, ConnectionState::Closed);
    channel.unregister(id);
    tracing::debug!("Reload client {} disconnected", id);
}
