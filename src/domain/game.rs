use super::card::Card;
use super::errors::GameError;
use super::player::Player;
use super::ports::{CryptoRandom, RandomSource};
use super::types::{GameStatus, Role, Winner};

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 8;
pub const STARTING_HAND_SIZE: usize = 3;

// Added to the player count to get the chest goal.
const GOAL_BONUS: i32 = 6;

// Per-player deck composition: (card, copies).
const DECK_PER_PLAYER: [(Card, usize); 4] = [
    (Card::score(1), 6),
    (Card::score(0), 4),
    (Card::score(-2), 3),
    (Card::accusation(), 3),
];

/// Cards contributed to the deck by each seated player.
pub const CARDS_PER_PLAYER: usize = 16;

/// Authoritative rules and state for one game.
///
/// Transport-agnostic; every transition either succeeds or returns exactly one
/// [`GameError`] without mutating anything.
pub struct Game {
    status: GameStatus,
    winner: Winner,
    players: Vec<Player>,
    chest_score: i32,
    goal_score: i32,
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    // Index into `players`; skips eliminated players.
    turn_index: usize,
    random: Box<dyn RandomSource>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// New lobby game backed by the OS-seeded generator.
    pub fn new() -> Self {
        Self::with_random(Box::new(CryptoRandom::new()))
    }

    pub fn with_random(random: Box<dyn RandomSource>) -> Self {
        Self {
            status: GameStatus::Lobby,
            winner: Winner::None,
            players: Vec::new(),
            chest_score: 0,
            goal_score: 0,
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            turn_index: 0,
            random,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Player ids in join order.
    pub fn player_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn chest_score(&self) -> i32 {
        self.chest_score
    }

    pub fn goal_score(&self) -> i32 {
        self.goal_score
    }

    pub fn draw_count(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_count(&self) -> usize {
        self.discard_pile.len()
    }

    /// The turn holder, or `None` when nobody can act.
    pub fn current_player_id(&self) -> Option<&str> {
        self.players
            .get(self.turn_index)
            .filter(|p| p.is_active())
            .map(|p| p.id.as_str())
    }

    // Swaps a hand while keeping the card total constant: the old hand goes
    // back on the pile and as many cards as the new hand holds come off it.
    #[cfg(test)]
    pub(crate) fn replace_hand(&mut self, player_id: &str, hand: Vec<Card>) {
        let seat = self.position(player_id).expect("expected player");
        let old = std::mem::replace(&mut self.players[seat].hand, hand);
        let taken = self.players[seat].hand.len();
        self.draw_pile.extend(old);
        let keep = self.draw_pile.len().saturating_sub(taken);
        self.draw_pile.truncate(keep);
    }

    /// Adds a player to the lobby, preserving join order.
    pub fn add_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if player.id.is_empty() {
            return Err(GameError::InvalidPlayer);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }
        if self.position(&player.id).is_some() {
            return Err(GameError::DuplicatePlayer);
        }
        self.players.push(player);
        Ok(())
    }

    /// Moves the lobby into play: assigns roles, shuffles the deck and deals
    /// [`STARTING_HAND_SIZE`] cards to every player.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::CannotStart);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if self.players.len() > MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }

        let deck = build_deck(self.players.len());
        self.start_with_deck(deck);
        Ok(())
    }

    fn start_with_deck(&mut self, mut deck: Vec<Card>) {
        self.status = GameStatus::InProgress;
        self.winner = Winner::None;
        self.chest_score = 0;
        self.goal_score = self.players.len() as i32 + GOAL_BONUS;
        self.turn_index = 0;

        self.assign_roles();

        shuffle(&mut deck, self.random.as_mut());
        self.draw_pile = deck;
        self.discard_pile.clear();

        for player in &mut self.players {
            player.reset_for_deal();
        }
        for seat in 0..self.players.len() {
            for _ in 0..STARTING_HAND_SIZE {
                let Some(card) = self.draw_pile.pop() else {
                    // Deck cannot cover the opening deal.
                    self.finish_by_threshold();
                    return;
                };
                self.players[seat].hand.push(card);
            }
        }

        self.normalize_turn_index();
        self.evaluate_end_conditions();
    }

    // Uniform selection of impostors without replacement (partial Fisher-Yates).
    fn assign_roles(&mut self) {
        let count = self.players.len();
        let impostors = impostor_count(count).min(count);
        let mut seats: Vec<usize> = (0..count).collect();
        for i in 0..impostors {
            let j = self.random.int_in_range(i, count);
            seats.swap(i, j);
        }

        for player in &mut self.players {
            player.role = Role::Good;
        }
        for &seat in &seats[..impostors] {
            self.players[seat].role = Role::Impostor;
        }
    }

    pub fn play_score_card(&mut self, player_id: &str, hand_index: usize) -> Result<(), GameError> {
        let actor = self.acting_seat(player_id)?;
        let card = *self.players[actor]
            .hand
            .get(hand_index)
            .ok_or(GameError::InvalidHandIndex)?;
        if !card.is_score() {
            return Err(GameError::InvalidCardType);
        }

        // All checks passed; commit.
        self.players[actor].hand.remove(hand_index);
        self.chest_score += card.value;
        self.discard_pile.push(card);

        self.draw_and_advance(actor);
        self.evaluate_end_conditions();
        Ok(())
    }

    pub fn play_accusation_card(
        &mut self,
        player_id: &str,
        hand_index: usize,
        target_id: &str,
    ) -> Result<(), GameError> {
        let actor = self.acting_seat(player_id)?;
        if target_id.is_empty() || target_id == player_id {
            return Err(GameError::InvalidTarget);
        }
        let card = *self.players[actor]
            .hand
            .get(hand_index)
            .ok_or(GameError::InvalidHandIndex)?;
        if !card.is_accusation() {
            return Err(GameError::InvalidCardType);
        }
        let target = self.position(target_id).ok_or(GameError::TargetNotFound)?;
        if self.players[target].eliminated {
            return Err(GameError::InvalidTarget);
        }

        self.players[actor].hand.remove(hand_index);
        self.players[target].receive_accusation();
        self.discard_pile.push(card);

        self.draw_and_advance(actor);
        self.evaluate_end_conditions();
        Ok(())
    }

    /// Ends the round on a Good player's request and settles the winner by the chest.
    pub fn call_over(&mut self, player_id: &str) -> Result<(), GameError> {
        self.ensure_in_progress()?;
        let seat = self.position(player_id).ok_or(GameError::PlayerNotFound)?;
        let player = &self.players[seat];
        if player.eliminated {
            return Err(GameError::PlayerEliminated);
        }
        if player.role != Role::Good {
            return Err(GameError::OnlyGoodCanCall);
        }
        self.finish_by_threshold();
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<(), GameError> {
        match self.status {
            GameStatus::InProgress => Ok(()),
            GameStatus::Finished => Err(GameError::GameFinished),
            GameStatus::Lobby => Err(GameError::InvalidState),
        }
    }

    // Seat of a player allowed to play a card right now.
    fn acting_seat(&self, player_id: &str) -> Result<usize, GameError> {
        self.ensure_in_progress()?;
        let seat = self.position(player_id).ok_or(GameError::PlayerNotFound)?;
        if self.players[seat].eliminated {
            return Err(GameError::PlayerEliminated);
        }
        if self.current_player_id() != Some(player_id) {
            return Err(GameError::NotPlayersTurn);
        }
        Ok(seat)
    }

    fn position(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    fn draw_and_advance(&mut self, actor: usize) {
        match self.draw_pile.pop() {
            Some(card) => self.players[actor].hand.push(card),
            None => {
                self.finish_by_threshold();
                return;
            }
        }
        self.advance_turn();
    }

    fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.players.len();
        self.normalize_turn_index();
    }

    fn normalize_turn_index(&mut self) {
        let count = self.players.len();
        for offset in 0..count {
            let seat = (self.turn_index + offset) % count;
            if self.players[seat].is_active() {
                self.turn_index = seat;
                return;
            }
        }
        // Nobody left to act.
        self.turn_index = 0;
    }

    fn finish_by_threshold(&mut self) {
        let winner = if self.chest_score >= self.goal_score {
            Winner::Good
        } else {
            Winner::Impostor
        };
        self.finish(winner);
    }

    fn finish(&mut self, winner: Winner) {
        self.status = GameStatus::Finished;
        self.winner = winner;
    }

    fn evaluate_end_conditions(&mut self) {
        if self.status != GameStatus::InProgress {
            return;
        }
        let alive = self.players.iter().filter(|p| p.is_active());
        let (alive_players, alive_impostors) = alive.fold((0, 0), |(all, imp), p| {
            (all + 1, imp + usize::from(p.is_impostor()))
        });
        if alive_players == 0 {
            self.finish(Winner::None);
        } else if alive_impostors == 0 {
            self.finish(Winner::Good);
        }
    }
}

/// Impostors seated for a given table size.
pub fn impostor_count(players: usize) -> usize {
    if players <= 5 { 1 } else { 2 }
}

/// Total cards in play for a given table size.
pub fn deck_size(players: usize) -> usize {
    players * CARDS_PER_PLAYER
}

fn build_deck(players: usize) -> Vec<Card> {
    let mut deck = Vec::with_capacity(deck_size(players));
    for _ in 0..players {
        for (card, copies) in DECK_PER_PLAYER {
            deck.extend(std::iter::repeat_n(card, copies));
        }
    }
    deck
}

// Fisher-Yates.
fn shuffle(cards: &mut [Card], random: &mut dyn RandomSource) {
    for i in (1..cards.len()).rev() {
        let j = random.int_in_range(0, i + 1);
        cards.swap(i, j);
    }
}
