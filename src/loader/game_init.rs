//! Game lifecycle: assemble a game from deck lists and run it
//!
//! `Game` is the outward-facing builder: create it over a card database,
//! add two players with their decks, and start. Starting shuffles with
//! the configured seed, draws opening hands, and drives the game to a
//! result with the given (or default random) controllers.

use crate::game::{
    GameLoop, GameLogger, GameResult, GameState, PlayerController, RandomController,
    VerbosityLevel,
};
use crate::loader::database::CardDatabase;
use crate::loader::deck::DeckList;
use crate::{Result, SimError};

const OPENING_HAND_SIZE: usize = 7;

pub struct Game<'a> {
    card_db: &'a CardDatabase,
    players: Vec<(String, DeckList)>,
    starting_life: i32,
    max_turns: u32,
    seed: u64,
    verbosity: VerbosityLevel,
}

impl<'a> Game<'a> {
    pub fn new(card_db: &'a CardDatabase) -> Self {
        Game {
            card_db,
            players: Vec::new(),
            starting_life: 20,
            max_turns: 100,
            seed: 0,
            verbosity: VerbosityLevel::Normal,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Register a player and their deck. Every card must resolve in the
    /// database; a two-player game is full after two calls.
    pub fn add_player(&mut self, name: impl Into<String>, deck: DeckList) -> Result<()> {
        if self.players.len() >= 2 {
            return Err(SimError::InvalidAction(
                "game already has two players".to_string(),
            ));
        }
        for entry in &deck.main_deck {
            if !self.card_db.contains(&entry.card_name) {
                return Err(SimError::UnknownCard(entry.card_name.clone()));
            }
        }
        self.players.push((name.into(), deck));
        Ok(())
    }

    /// Build the initial game state: libraries loaded and shuffled,
    /// opening hands drawn
    pub fn build_state(&self) -> Result<GameState> {
        if self.players.len() != 2 {
            return Err(SimError::InvalidAction(format!(
                "need exactly two players, have {}",
                self.players.len()
            )));
        }

        let mut game = GameState::new_two_player(
            self.players[0].0.clone(),
            self.players[1].0.clone(),
            self.starting_life,
        );
        game.logger = GameLogger::with_verbosity(self.verbosity);
        game.seed_rng(self.seed);

        for (slot, (_, deck)) in self.players.iter().enumerate() {
            let player_id = game.players[slot].id;
            for entry in &deck.main_deck {
                let data = self
                    .card_db
                    .get_card(&entry.card_name)
                    .ok_or_else(|| SimError::UnknownCard(entry.card_name.clone()))?
                    .clone();
                for _ in 0..entry.count {
                    game.add_card_to_library(player_id, data.clone())?;
                }
            }
            game.shuffle_library(player_id)?;
            for _ in 0..OPENING_HAND_SIZE {
                game.draw_card(player_id)?;
            }
        }
        Ok(game)
    }

    /// Run the game to completion with the given controllers
    pub fn start_with(
        &self,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<GameResult> {
        let mut game = self.build_state()?;
        GameLoop::new(&mut game)
            .with_max_turns(self.max_turns)
            .run_game(controllers)
    }

    /// Run the game with seeded random controllers for both seats
    pub fn start(&self) -> Result<GameResult> {
        let mut game = self.build_state()?;
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;

        let mut c1 = RandomController::new(p1, self.seed.wrapping_add(1));
        let mut c2 = RandomController::new(p2, self.seed.wrapping_add(2));
        let mut controllers: Vec<&mut dyn PlayerController> = vec![&mut c1, &mut c2];
        GameLoop::new(&mut game)
            .with_max_turns(self.max_turns)
            .run_game(&mut controllers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameEndReason;
    use crate::loader::deck::DeckLoader;

    fn green_deck() -> DeckList {
        DeckLoader::parse("24 Forest\n36 Grizzly Bears\n").unwrap()
    }

    #[test]
    fn test_unknown_card_rejected() {
        let db = CardDatabase::demo();
        let mut game = Game::new(&db);
        let deck = DeckLoader::parse("60 Storm Crow\n").unwrap();
        assert!(matches!(
            game.add_player("Alice", deck),
            Err(SimError::UnknownCard(_))
        ));
    }

    #[test]
    fn test_build_state_draws_opening_hands() {
        let db = CardDatabase::demo();
        let mut game = Game::new(&db);
        game.add_player("Alice", green_deck()).unwrap();
        game.add_player("Bob", green_deck()).unwrap();

        let state = game.build_state().unwrap();
        for player in &state.players {
            let zones = state.get_player_zones(player.id).unwrap();
            assert_eq!(zones.hand.len(), 7);
            assert_eq!(zones.library.len(), 53);
        }
    }

    #[test]
    fn test_start_needs_two_players() {
        let db = CardDatabase::demo();
        let mut game = Game::new(&db);
        game.add_player("Alice", green_deck()).unwrap();
        assert!(game.start().is_err());
    }

    #[test]
    fn test_full_game_runs() {
        let db = CardDatabase::demo();
        let mut game = Game::new(&db)
            .with_seed(42)
            .with_max_turns(50)
            .with_verbosity(VerbosityLevel::Silent);
        game.add_player("Alice", green_deck()).unwrap();
        game.add_player("Bob", green_deck()).unwrap();

        let result = game.start().unwrap();
        assert!(result.turns_played >= 1);
        if result.end_reason != GameEndReason::TurnLimit {
            assert!(result.winner.is_some());
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let db = CardDatabase::demo();
        let run = |seed: u64| {
            let mut game = Game::new(&db)
                .with_seed(seed)
                .with_max_turns(40)
                .with_verbosity(VerbosityLevel::Silent);
            game.add_player("Alice", green_deck()).unwrap();
            game.add_player("Bob", green_deck()).unwrap();
            game.start().unwrap()
        };
        assert_eq!(run(7), run(7));
    }
}
