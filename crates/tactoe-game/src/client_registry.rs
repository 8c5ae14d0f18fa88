//! The client registry: every currently connected session, keyed by
//! connection id.
//!
//! Mirrors the original server's semaphore-gated client table: a fixed
//! capacity, and a `wait_for_empty`/`shutdown_all` pair used by the
//! top-level service to drain connections before exiting.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use tactoe_registry::Player;
use tactoe_transport::ConnectionId;

use crate::{ClientSession, RegistryError};

struct Inner {
    clients: HashMap<ConnectionId, Arc<ClientSession>>,
}

/// Table of every live connection, plus a condition variable signaled
/// whenever the table becomes empty (used to implement a clean shutdown
/// that waits for every client to disconnect).
pub struct ClientRegistry {
    capacity: usize,
    inner: Mutex<Inner>,
    empty: Condvar,
}

impl ClientRegistry {
    pub fn new(capacity: usize) -> Self {
        ClientRegistry {
            capacity,
            inner: Mutex::new(Inner { clients: HashMap::new() }),
            empty: Condvar::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("client registry mutex poisoned").clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `client` to the table, keyed by its connection id.
    pub fn register(&self, client: Arc<ClientSession>) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().expect("client registry mutex poisoned");
        if inner.clients.len() >= self.capacity {
            return Err(RegistryError::Full);
        }
        if inner.clients.contains_key(&client.id()) {
            return Err(RegistryError::AlreadyRegistered);
        }
        inner.clients.insert(client.id(), client);
        Ok(())
    }

    /// Removes the client at `id`, notifying any thread waiting in
    /// [`Self::wait_for_empty`] if the table just became empty.
    pub fn unregister(&self, id: ConnectionId) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().expect("client registry mutex poisoned");
        if inner.clients.remove(&id).is_none() {
            return Err(RegistryError::NotRegistered);
        }
        if inner.clients.is_empty() {
            self.empty.notify_all();
        }
        Ok(())
    }

    /// Finds the logged-in client session for `username`, if any.
    pub fn lookup(&self, username: &str) -> Option<Arc<ClientSession>> {
        let inner = self.inner.lock().expect("client registry mutex poisoned");
        inner
            .clients
            .values()
            .find(|client| client.username().as_deref() == Some(username))
            .cloned()
    }

    /// Every currently logged-in player, for the `USERS` listing.
    pub fn all_players(&self) -> Vec<Arc<Player>> {
        let inner = self.inner.lock().expect("client registry mutex poisoned");
        inner.clients.values().filter_map(|client| client.player()).collect()
    }

    /// Blocks until the table is empty.
    pub fn wait_for_empty(&self) {
        let inner = self.inner.lock().expect("client registry mutex poisoned");
        let _guard = self
            .empty
            .wait_while(inner, |inner| !inner.clients.is_empty())
            .expect("client registry mutex poisoned");
    }

    /// Logs out and shuts down every registered connection, e.g. on
    /// SIGHUP. Does not wait for the connections' service threads to
    /// notice and exit — pair with [`Self::wait_for_empty`] for that.
    pub fn shutdown_all(&self) {
        let clients: Vec<Arc<ClientSession>> = {
            let inner = self.inner.lock().expect("client registry mutex poisoned");
            inner.clients.values().cloned().collect()
        };
        for client in clients {
            client.logout();
            if let Err(e) = client.shutdown() {
                tracing::warn!(error = %e, "failed to shut down client connection");
            }
        }
    }
}
