// Wire protocol DTOs and conversions for WebSocket messages.
// Every frame is a JSON object tagged by `type`.

use crate::domain::{Card, GameStatus, GameView, PublicPlayerView, Role, SelfView, Winner};
use serde::{Deserialize, Serialize};

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // Handshake: open a new lobby.
    CreateLobby { name: String },
    // Handshake: join an existing lobby by code.
    JoinLobby { code: String, name: String },
    StartGame,
    // A target turns the play into an accusation.
    PlayCard {
        hand_index: i64,
        #[serde(default)]
        target_id: Option<String>,
    },
    CallOver,
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    LobbyCreated { code: String, player_id: String },
    LobbyJoined { code: String, player_id: String },
    // Per-recipient snapshot; never shared between players.
    State { state: GameViewDto },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameViewDto {
    pub code: String,
    pub status: GameStatus,
    pub winner: Winner,
    pub chest_score: i32,
    pub goal_score: i32,
    pub draw_count: usize,
    pub current_turn_player_id: Option<String>,
    pub players: Vec<PublicPlayerDto>,
    pub you: SelfDto,
}

impl From<GameView> for GameViewDto {
    fn from(view: GameView) -> Self {
        Self {
            code: view.session_code,
            status: view.status,
            winner: view.winner,
            chest_score: view.chest_score,
            goal_score: view.goal_score,
            draw_count: view.draw_count,
            current_turn_player_id: view.current_turn_player_id,
            players: view.players.into_iter().map(PublicPlayerDto::from).collect(),
            you: view.you.into(),
        }
    }
}

// Public record; hand contents are reduced to a count.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPlayerDto {
    pub id: String,
    pub name: String,
    pub accusations: u32,
    pub eliminated: bool,
    pub hand_count: usize,
}

impl From<PublicPlayerView> for PublicPlayerDto {
    fn from(player: PublicPlayerView) -> Self {
        Self {
            id: player.id,
            name: player.display_name,
            accusations: player.accusations,
            eliminated: player.eliminated,
            hand_count: player.hand_count,
        }
    }
}

// Private record for the recipient only.
#[derive(Debug, Clone, Serialize)]
pub struct SelfDto {
    pub id: String,
    pub role: Role,
    pub hand: Vec<Card>,
}

impl From<SelfView> for SelfDto {
    fn from(me: SelfView) -> Self {
        Self {
            id: me.id,
            role: me.role,
            hand: me.hand,
        }
    }
}
