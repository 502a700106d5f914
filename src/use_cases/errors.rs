use crate::domain::GameError;

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 32;

// Errors surfaced by session workflows. Engine errors pass through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("lobby not found")]
    SessionNotFound,
    #[error("lobby code collision")]
    CodeCollision,
    #[error("display name must be 1 to {} characters", MAX_DISPLAY_NAME_LEN)]
    InvalidDisplayName,
    #[error(transparent)]
    Game(#[from] GameError),
}
