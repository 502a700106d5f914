use serde::{Deserialize, Serialize};

// Hidden team for a player; only ever revealed to its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Good,
    Impostor,
}

// Lifecycle of a game. Moves forward only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Lobby,
    InProgress,
    Finished,
}

// Outcome once the game is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    #[default]
    None,
    Good,
    Impostor,
}
