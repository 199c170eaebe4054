use crate::core_control::{CancelReason, CancellationSignal};
use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::Instant;

#[derive(Debug)]
struct ClientEntry {
    peer: SocketAddr,
    signal: CancellationSignal,
    username: Option<String>,
    command: String,
    connected: Instant,
}

/// What `SITE WHO` shows about one session.
#[derive(Debug, Clone)]
pub struct ClientSummary {
    pub id: u64,
    pub peer: SocketAddr,
    pub username: Option<String>,
    pub command: String,
    pub connected_for: Duration,
}

/// Every live session of the server, reachable through its cancellation signal.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<u64, ClientEntry>>,
    next_id: AtomicU64,
    drained: Notify,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, peer: SocketAddr, signal: CancellationSignal) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.clients.write().await.insert(
            id,
            ClientEntry {
                peer,
                signal,
                username: None,
                command: String::new(),
                connected: Instant::now(),
            },
        );
        debug!("Registered client {} from {}", id, peer);
        id
    }

    pub async fn unregister(&self, id: u64) {
        let mut clients = self.clients.write().await;
        clients.remove(&id);
        if clients.is_empty() {
            self.drained.notify_waiters();
        }
    }

    pub async fn set_username(&self, id: u64, username: &str) {
        if let Some(entry) = self.clients.write().await.get_mut(&id) {
            entry.username = Some(username.to_string());
        }
    }

    pub async fn set_command(&self, id: u64, command: &str) {
        if let Some(entry) = self.clients.write().await.get_mut(&id) {
            entry.command = command.to_string();
        }
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<ClientSummary> {
        let mut summaries: Vec<ClientSummary> = self
            .clients
            .read()
            .await
            .iter()
            .map(|(id, entry)| ClientSummary {
                id: *id,
                peer: entry.peer,
                username: entry.username.clone(),
                command: entry.command.clone(),
                connected_for: entry.connected.elapsed(),
            })
            .collect();
        summaries.sort_by_key(|summary| summary.id);
        summaries
    }

    /// Cancels every session logged in as `username`. Returns how many.
    pub async fn kick(&self, username: &str) -> usize {
        let clients = self.clients.read().await;
        let mut kicked = 0;
        for entry in clients.values() {
            if entry.username.as_deref() == Some(username) {
                entry.signal.cancel(CancelReason::Kicked);
                kicked += 1;
            }
        }
        if kicked > 0 {
            info!("Kicked {} session(s) of {}", kicked, username);
        }
        kicked
    }

    pub async fn cancel_all(&self, reason: CancelReason) {
        let clients = self.clients.read().await;
        for entry in clients.values() {
            entry.signal.cancel(reason);
        }
        info!("Cancelled {} session(s): {}", clients.len(), reason);
    }

    /// Waits until no session is registered. Returns false on timeout.
    pub async fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let drained = self.drained.notified();
            if self.is_empty().await {
                return true;
            }
            if tokio::time::timeout_at(deadline, drained).await.is_err() {
                return self.is_empty().await;
            }
        }
    }
}
