// Per-recipient projection of a game.
//
// A view carries the requester's own role and hand; every other player is
// reduced to public fields and a hand count.

use super::card::Card;
use super::errors::GameError;
use super::game::Game;
use super::types::{GameStatus, Role, Winner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPlayerView {
    pub id: String,
    pub display_name: String,
    pub accusations: u32,
    pub eliminated: bool,
    pub hand_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfView {
    pub id: String,
    pub role: Role,
    pub hand: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub session_code: String,
    pub status: GameStatus,
    pub winner: Winner,
    pub chest_score: i32,
    pub goal_score: i32,
    pub draw_count: usize,
    pub current_turn_player_id: Option<String>,
    pub players: Vec<PublicPlayerView>,
    pub you: SelfView,
}

impl Game {
    /// Builds a fresh snapshot for `player_id`. Never cache the result across mutations.
    pub fn view_for(&self, player_id: &str, session_code: &str) -> Result<GameView, GameError> {
        let me = self.player(player_id).ok_or(GameError::PlayerNotFound)?;

        let players = self
            .players()
            .iter()
            .map(|p| PublicPlayerView {
                id: p.id.clone(),
                display_name: p.display_name.clone(),
                accusations: p.accusations,
                eliminated: p.eliminated,
                hand_count: p.hand.len(),
            })
            .collect();

        Ok(GameView {
            session_code: session_code.to_string(),
            status: self.status(),
            winner: self.winner(),
            chest_score: self.chest_score(),
            goal_score: self.goal_score(),
            draw_count: self.draw_count(),
            current_turn_player_id: self.current_player_id().map(str::to_string),
            players,
            you: SelfView {
                id: me.id.clone(),
                role: me.role,
                hand: me.hand.clone(),
            },
        })
    }
}
