use crate::domain::Game;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// One game plus its external code, behind an exclusive-access gate.
///
/// The game is only reachable through [`Session::run_exclusive`], so every
/// action and view read within a session is strictly serialized while
/// different sessions never contend.
pub struct Session {
    code: Arc<str>,
    created_at: u64,
    game: Mutex<Game>,
}

impl Session {
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self::with_game(code, Game::new())
    }

    pub fn with_game(code: impl Into<Arc<str>>, game: Game) -> Self {
        Self {
            code: code.into(),
            created_at: current_epoch_seconds(),
            game: Mutex::new(game),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Runs `f` with exclusive access to the game and returns its result.
    ///
    /// Waiting for the gate is the only suspension point; `f` itself runs
    /// synchronously. The gate is released on every exit path, including a
    /// panic inside `f`.
    pub async fn run_exclusive<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Game) -> R,
    {
        let mut game = self.game.lock().await;
        f(&mut game)
    }
}

fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
