// Domain layer: card game entities and rules.

pub mod card;
pub mod errors;
pub mod game;
pub mod player;
pub mod ports;
pub mod types;
pub mod view;

pub use card::{Card, CardKind};
pub use errors::GameError;
pub use game::{Game, MAX_PLAYERS, MIN_PLAYERS, STARTING_HAND_SIZE};
pub use player::Player;
pub use ports::{CryptoRandom, RandomSource, SeededRandom};
pub use types::{GameStatus, Role, Winner};
pub use view::{GameView, PublicPlayerView, SelfView};
