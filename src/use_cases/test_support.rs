use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::use_cases::ports::{DirectoryError, IdGenerator, SessionDirectory};
use crate::use_cases::session::Session;

pub(crate) type SessionTable = Arc<Mutex<HashMap<String, Arc<Session>>>>;

// Predictable ids for use-case tests: CODE1, CODE2, ... and player-1, player-2, ...
#[derive(Default)]
pub(crate) struct SequentialIds {
    codes: AtomicUsize,
    players: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn session_code(&self) -> String {
        format!("CODE{}", self.codes.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn player_id(&self) -> String {
        format!("player-{}", self.players.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Clone)]
pub(crate) struct RecordingDirectory {
    sessions: SessionTable,
    // Number of upcoming `create` calls that report a collision.
    collisions: Arc<AtomicUsize>,
}

impl RecordingDirectory {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            collisions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_collisions(self, collisions: usize) -> Self {
        self.collisions.store(collisions, Ordering::Relaxed);
        self
    }

    pub(crate) fn contains(&self, code: &str) -> bool {
        let guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.contains_key(code)
    }
}

#[async_trait]
impl SessionDirectory for RecordingDirectory {
    async fn create(&self, code: &str, session: Arc<Session>) -> Result<(), DirectoryError> {
        let pending = self.collisions.load(Ordering::Relaxed);
        if pending > 0 {
            self.collisions.store(pending - 1, Ordering::Relaxed);
            return Err(DirectoryError::CodeCollision);
        }

        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        if guard.contains_key(code) {
            return Err(DirectoryError::CodeCollision);
        }
        guard.insert(code.to_string(), session);
        Ok(())
    }

    async fn get(&self, code: &str) -> Option<Arc<Session>> {
        let guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.get(code).cloned()
    }

    async fn delete(&self, code: &str) -> bool {
        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.remove(code).is_some()
    }

    async fn count(&self) -> usize {
        let guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.len()
    }
}
