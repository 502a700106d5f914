use super::card::Card;
use super::types::Role;

/// Accusations a player can absorb before being eliminated.
pub const ACCUSATIONS_TO_ELIMINATE: u32 = 3;

/// A participant in a session.
///
/// The hand and role are private; only the view projector decides who may see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub hand: Vec<Card>,
    pub accusations: u32,
    pub eliminated: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: Role::default(),
            hand: Vec::new(),
            accusations: 0,
            eliminated: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    pub fn is_impostor(&self) -> bool {
        self.role == Role::Impostor
    }

    // Records one accusation; elimination is sticky once the threshold is reached.
    pub(crate) fn receive_accusation(&mut self) {
        self.accusations += 1;
        if self.accusations >= ACCUSATIONS_TO_ELIMINATE {
            self.eliminated = true;
        }
    }

    // Clears per-game state before a deal.
    pub(crate) fn reset_for_deal(&mut self) {
        self.accusations = 0;
        self.eliminated = false;
        self.hand.clear();
    }
}
