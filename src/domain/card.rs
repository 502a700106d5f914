use serde::{Deserialize, Serialize};

// Card kinds available in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Score,
    Accusation,
}

/// A single card in the deck, a hand, or the discard pile.
///
/// Score cards carry one of `+1`, `0` or `-2`. Accusation cards always carry `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub kind: CardKind,
    pub value: i32,
}

impl Card {
    pub const fn score(value: i32) -> Self {
        Self {
            kind: CardKind::Score,
            value,
        }
    }

    pub const fn accusation() -> Self {
        Self {
            kind: CardKind::Accusation,
            value: 0,
        }
    }

    pub fn is_score(&self) -> bool {
        self.kind == CardKind::Score
    }

    pub fn is_accusation(&self) -> bool {
        self.kind == CardKind::Accusation
    }
}
