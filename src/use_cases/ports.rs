use async_trait::async_trait;
use std::sync::Arc;

use crate::use_cases::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("lobby code collision")]
    CodeCollision,
}

// Port for the keyed store of live sessions.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Registers `session` under `code`; fails if the code is taken.
    async fn create(&self, code: &str, session: Arc<Session>) -> Result<(), DirectoryError>;
    async fn get(&self, code: &str) -> Option<Arc<Session>>;
    /// Returns true if a session was removed.
    async fn delete(&self, code: &str) -> bool;
    async fn count(&self) -> usize;
}

// Port for external identifiers (session codes and player ids).
pub trait IdGenerator: Send + Sync {
    fn session_code(&self) -> String;
    fn player_id(&self) -> String;
}
