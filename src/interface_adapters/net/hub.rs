use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::SessionService;

pub type Outbound = mpsc::Sender<ServerMessage>;

const FULL_QUEUE_LOG_THROTTLE: Duration = Duration::from_secs(2);

struct Registration {
    // Owning connection; a stale socket must not evict a newer one.
    conn_id: u64,
    tx: Outbound,
}

/// Live connections keyed by session code, then player id.
#[derive(Default)]
pub struct ConnectionHub {
    sessions: RwLock<HashMap<String, HashMap<String, Registration>>>,
    last_full_log: Mutex<Option<Instant>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, code: &str, player_id: &str, conn_id: u64, tx: Outbound) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(code.to_string())
            .or_default()
            .insert(player_id.to_string(), Registration { conn_id, tx });
    }

    /// Removes the registration if `conn_id` still owns it and returns the
    /// number of connections left in the session.
    pub async fn unregister(&self, code: &str, player_id: &str, conn_id: u64) -> usize {
        let mut sessions = self.sessions.write().await;
        let Entry::Occupied(mut entry) = sessions.entry(code.to_string()) else {
            return 0;
        };

        let peers = entry.get_mut();
        if peers
            .get(player_id)
            .is_some_and(|registration| registration.conn_id == conn_id)
        {
            peers.remove(player_id);
        }

        let remaining = peers.len();
        if remaining == 0 {
            entry.remove();
        }
        remaining
    }

    /// Snapshot of the outbound queues for a session.
    pub async fn connected(&self, code: &str) -> HashMap<String, Outbound> {
        let sessions = self.sessions.read().await;
        sessions
            .get(code)
            .map(|peers| {
                peers
                    .iter()
                    .map(|(player_id, registration)| (player_id.clone(), registration.tx.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn connection_count(&self, code: &str) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(code).map_or(0, HashMap::len)
    }

    /// Sends every connected player of `code` its own freshly computed view.
    ///
    /// Views are built and queued under the session gate, so each queue holds
    /// snapshots in mutation order even when several connections broadcast at
    /// once. Views are full snapshots: a queue that is full simply misses this
    /// one and catches up on the next broadcast.
    pub async fn broadcast_state(&self, service: &SessionService, code: &str) {
        let peers = self.connected(code).await;
        if peers.is_empty() {
            return;
        }

        let mut dropped = Vec::new();
        let published = service
            .publish_views(
                code,
                |player_id| peers.contains_key(player_id),
                |view| {
                    let Some(tx) = peers.get(&view.you.id) else {
                        return;
                    };
                    let player_id = view.you.id.clone();
                    match tx.try_send(ServerMessage::State { state: view.into() }) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => dropped.push(player_id),
                        Err(TrySendError::Closed(_)) => {
                            debug!(code, player_id = %player_id, "outbound queue closed");
                        }
                    }
                },
            )
            .await;

        if let Err(e) = published {
            debug!(code, error = %e, "skipping broadcast");
            return;
        }

        if !dropped.is_empty() && self.should_log_full().await {
            warn!(code, players = ?dropped, "outbound queue full; dropping state");
        }
    }

    async fn should_log_full(&self) -> bool {
        let mut last = self.last_full_log.lock().await;
        match *last {
            Some(at) if at.elapsed() < FULL_QUEUE_LOG_THROTTLE => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}
