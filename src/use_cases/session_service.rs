// Session orchestration: one gate call per external request.

use crate::domain::{Game, GameError, GameStatus, GameView, Player};
use crate::use_cases::errors::{MAX_DISPLAY_NAME_LEN, ServiceError};
use crate::use_cases::ports::{DirectoryError, IdGenerator, SessionDirectory};
use crate::use_cases::session::Session;
use std::sync::Arc;
use tracing::{info, warn};

/// Tunables for session workflows.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Fresh codes tried before giving up on a collision streak.
    pub code_attempts: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { code_attempts: 10 }
    }
}

/// Identity handed back after creating or joining a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub code: String,
    pub player_id: String,
}

/// Transport-agnostic entry point for every session workflow.
pub struct SessionService {
    directory: Arc<dyn SessionDirectory>,
    ids: Arc<dyn IdGenerator>,
    settings: SessionSettings,
}

impl SessionService {
    pub fn new(
        directory: Arc<dyn SessionDirectory>,
        ids: Arc<dyn IdGenerator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            directory,
            ids,
            settings,
        }
    }

    /// Opens a new lobby with the caller as its first player.
    pub async fn create_session(&self, display_name: &str) -> Result<JoinedSession, ServiceError> {
        let display_name = validate_display_name(display_name)?;

        for attempt in 1..=self.settings.code_attempts {
            let code = self.ids.session_code();
            let player_id = self.ids.player_id();
            let session = Arc::new(Session::new(code.clone()));
            let player = Player::new(player_id.clone(), display_name.clone());
            session.run_exclusive(|game| game.add_player(player)).await?;

            match self.directory.create(&code, session).await {
                Ok(()) => {
                    info!(code = %code, player_id = %player_id, "session created");
                    return Ok(JoinedSession { code, player_id });
                }
                Err(DirectoryError::CodeCollision) => {
                    warn!(attempt, "session code collision; retrying");
                }
            }
        }

        Err(ServiceError::CodeCollision)
    }

    pub async fn join_session(
        &self,
        code: &str,
        display_name: &str,
    ) -> Result<JoinedSession, ServiceError> {
        let display_name = validate_display_name(display_name)?;
        let session = self.session(code).await?;
        let player_id = self.ids.player_id();
        let player = Player::new(player_id.clone(), display_name);

        let seated = session
            .run_exclusive(|game| {
                game.add_player(player)?;
                Ok::<_, GameError>(game.players().len())
            })
            .await?;

        info!(code, player_id = %player_id, seated, "player joined");
        Ok(JoinedSession {
            code: code.to_string(),
            player_id,
        })
    }

    pub async fn start_game(&self, code: &str) -> Result<(), ServiceError> {
        self.apply(code, |game| game.start()).await?;
        info!(code, "game started");
        Ok(())
    }

    pub async fn play_score(
        &self,
        code: &str,
        player_id: &str,
        hand_index: usize,
    ) -> Result<(), ServiceError> {
        self.apply(code, |game| game.play_score_card(player_id, hand_index))
            .await
    }

    pub async fn play_accusation(
        &self,
        code: &str,
        player_id: &str,
        hand_index: usize,
        target_id: &str,
    ) -> Result<(), ServiceError> {
        self.apply(code, |game| {
            game.play_accusation_card(player_id, hand_index, target_id)
        })
        .await
    }

    pub async fn call_over(&self, code: &str, player_id: &str) -> Result<(), ServiceError> {
        self.apply(code, |game| game.call_over(player_id)).await
    }

    /// Fresh per-player snapshot; computed under the gate on every call.
    pub async fn view_for(&self, code: &str, player_id: &str) -> Result<GameView, ServiceError> {
        let session = self.session(code).await?;
        let view = session
            .run_exclusive(|game| game.view_for(player_id, session.code()))
            .await?;
        Ok(view)
    }

    /// Builds a view for every player accepted by `wants` and hands each one to
    /// `deliver`, all within one hold of the gate.
    ///
    /// Deliveries from concurrent callers therefore reach `deliver` in the same
    /// order as the mutations they observe. `deliver` runs under the gate and
    /// must not block. Returns the number of views delivered.
    pub async fn publish_views<W, D>(
        &self,
        code: &str,
        wants: W,
        mut deliver: D,
    ) -> Result<usize, ServiceError>
    where
        W: Fn(&str) -> bool,
        D: FnMut(GameView),
    {
        let session = self.session(code).await?;
        let published = session
            .run_exclusive(|game| {
                let mut published = 0;
                for player in game.players() {
                    if !wants(&player.id) {
                        continue;
                    }
                    deliver(game.view_for(&player.id, session.code())?);
                    published += 1;
                }
                Ok::<_, GameError>(published)
            })
            .await?;
        Ok(published)
    }

    /// Player ids in join order.
    pub async fn player_ids(&self, code: &str) -> Result<Vec<String>, ServiceError> {
        let session = self.session(code).await?;
        Ok(session.run_exclusive(|game| game.player_ids()).await)
    }

    /// Drops a session from the directory. Returns true if it existed.
    pub async fn close_session(&self, code: &str) -> bool {
        let removed = self.directory.delete(code).await;
        if removed {
            info!(code, "session closed");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.directory.count().await
    }

    async fn session(&self, code: &str) -> Result<Arc<Session>, ServiceError> {
        self.directory
            .get(code)
            .await
            .ok_or(ServiceError::SessionNotFound)
    }

    // Runs one engine transition and logs the moment the game ends.
    async fn apply<F>(&self, code: &str, action: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut Game) -> Result<(), GameError> + Send,
    {
        let session = self.session(code).await?;
        let finished = session
            .run_exclusive(|game| {
                let was_finished = game.status() == GameStatus::Finished;
                action(game)?;
                let finished_now = !was_finished && game.status() == GameStatus::Finished;
                Ok::<_, GameError>(finished_now.then(|| game.winner()))
            })
            .await?;

        if let Some(winner) = finished {
            info!(code, ?winner, "game finished");
        }
        Ok(())
    }
}

fn validate_display_name(display_name: &str) -> Result<String, ServiceError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ServiceError::InvalidDisplayName);
    }
    Ok(trimmed.to_string())
}
