// Domain-level errors for game rule transitions.
//
// The display text is what the acting client receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid game state")]
    InvalidState,
    #[error("game already finished")]
    GameFinished,
    #[error("player not found")]
    PlayerNotFound,
    #[error("not player's turn")]
    NotPlayersTurn,
    #[error("player is eliminated")]
    PlayerEliminated,
    #[error("invalid hand index")]
    InvalidHandIndex,
    #[error("invalid card type")]
    InvalidCardType,
    #[error("target player not found")]
    TargetNotFound,
    #[error("invalid target")]
    InvalidTarget,
    #[error("only good players can call over")]
    OnlyGoodCanCall,
    #[error("cannot start game")]
    CannotStart,
    #[error("not enough players")]
    NotEnoughPlayers,
    #[error("too many players")]
    TooManyPlayers,
    #[error("game already started")]
    AlreadyStarted,
    #[error("duplicate player id")]
    DuplicatePlayer,
    #[error("invalid player")]
    InvalidPlayer,
}
