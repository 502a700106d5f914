use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::interface_adapters::net::hub::ConnectionHub;
use crate::use_cases::{DirectoryError, Session, SessionDirectory, SessionService};

// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionService>,
    // Live sockets per session, used for state fan-out.
    pub hub: Arc<ConnectionHub>,
    pub net: NetSettings,
}

/// Per-connection transport limits.
#[derive(Debug, Clone)]
pub struct NetSettings {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub outbound_capacity: usize,
    pub max_invalid_messages: u32,
}

// In-memory session directory adapter; sessions live as long as the process.
#[derive(Clone, Default)]
pub struct InMemorySessionDirectory {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl InMemorySessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionDirectory for InMemorySessionDirectory {
    async fn create(&self, code: &str, session: Arc<Session>) -> Result<(), DirectoryError> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(code.to_string()) {
            Entry::Occupied(_) => Err(DirectoryError::CodeCollision),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    async fn get(&self, code: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(code).cloned()
    }

    async fn delete(&self, code: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(code).is_some()
    }

    async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn when_code_is_taken_then_create_reports_collision_and_keeps_first() {
        let directory = InMemorySessionDirectory::new();
        let first = Arc::new(Session::new("ABCD2345"));
        let second = Arc::new(Session::new("ABCD2345"));

        directory
            .create("ABCD2345", first.clone())
            .await
            .expect("first create should succeed");
        let result = directory.create("ABCD2345", second).await;

        assert_eq!(result, Err(DirectoryError::CodeCollision));
        let stored = directory.get("ABCD2345").await.expect("session stored");
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(directory.count().await, 1);
    }

    #[tokio::test]
    async fn when_session_is_deleted_then_lookups_miss() {
        let directory = InMemorySessionDirectory::new();
        directory
            .create("WXYZ6789", Arc::new(Session::new("WXYZ6789")))
            .await
            .expect("create should succeed");

        assert!(directory.delete("WXYZ6789").await);
        assert!(!directory.delete("WXYZ6789").await);
        assert!(directory.get("WXYZ6789").await.is_none());
        assert_eq!(directory.count().await, 0);
    }

    #[tokio::test]
    async fn when_code_is_unknown_then_get_returns_none() {
        let directory = InMemorySessionDirectory::new();
        assert!(directory.get("NOPE0000").await.is_none());
    }
}
