//! Reload channel: the set of connected browsers and the `reload` fan-out.
//!
//! Each browser page opens a WebSocket to the reload port. The socket task
//! registers itself here and gets back a receiver; [`ReloadChannel::broadcast`]
//! pushes the reload token to every connection that is currently open.
//! Delivery is fire-and-forget: no acknowledgement, no retry, no queueing
//! beyond a small per-client buffer.

pub mod socket;

pub use socket::reload_socket_handler;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// The only message the server ever pushes to a browser.
pub const RELOAD_MESSAGE: &str = "reload";

/// Messages buffered per client before further broadcasts are dropped.
const CLIENT_BUFFER: usize = 16;

/// Opaque handle identifying one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transport state of a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered, handshake not finished
    Connecting,
    /// Ready to receive messages
    Open,
    /// The browser started closing the socket
    Closing,
    /// The socket is gone; the entry is about to be removed
    Closed,
}

#[derive(Debug)]
struct ClientHandle {
    state: ConnectionState,
    sender: mpsc::Sender<&'static str>,
}

impl ClientHandle {
    fn is_open(&self) -> bool {
        self.state == ConnectionState::Open && !self.sender.is_closed()
    }
}

/// Registry of reload clients keyed by [`ClientId`].
///
/// Insert, remove and iterate all go through one `RwLock`, so broadcasts may
/// run while sockets connect and disconnect.
#[derive(Debug, Default)]
pub struct ReloadChannel {
    clients: RwLock<HashMap<ClientId, ClientHandle>>,
    next_id: AtomicU64,
}

impl ReloadChannel {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection in the `Connecting` state.
    ///
    /// Returns the connection's id and the receiver its socket task drains.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<&'static str>) {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(CLIENT_BUFFER);

        self.clients.write().insert(
            id,
            ClientHandle {
                state: ConnectionState::Connecting,
                sender,
            },
        );

        (id, receiver)
    }

    /// Update the transport state of a connection. Unknown ids are ignored.
    pub fn set_state(&self, id: ClientId, state: ConnectionState) {
        if let Some(client) = self.clients.write().get_mut(&id) {
            client.state = state;
        }
    }

    /// Current state of a connection, if it is still registered.
    pub fn state(&self, id: ClientId) -> Option<ConnectionState> {
        self.clients.read().get(&id).map(|client| client.state)
    }

    /// Remove a connection from the registry.
    pub fn unregister(&self, id: ClientId) {
        self.clients.write().remove(&id);
    }

    /// Number of registered connections, in any state.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Number of connections currently open.
    pub fn open_count(&self) -> usize {
        self.clients
            .read()
            .values()
            .filter(|client| client.is_open())
            .count()
    }

    /// Send the reload token to every open connection.
    ///
    /// Connections in any other state are skipped. A client whose buffer is
    /// full misses this reload; a client whose socket task has ended is
    /// pruned. Returns the number of clients the token was handed to.
    pub fn broadcast(&self) -> usize {
        let mut notified = 0usize;
        let mut gone = Vec::new();

        {
            let clients = self.clients.read();
            for (id, client) in clients.iter() {
                if !client.is_open() {
                    if client.sender.is_closed() {
                        gone.push(*id);
                    }
                    continue;
                }

                match client.sender.try_send(RELOAD_MESSAGE) {
                    Ok(()) => notified += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::debug!("Reload client {} is busy, skipping", id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }

        if !gone.is_empty() {
            let mut clients = self.clients.write();
            for id in gone {
                clients.remove(&id);
            }
        }

        notified
    }
}
