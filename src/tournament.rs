//! Batch simulation: many independent games in parallel
//!
//! Games share nothing; each gets its own state seeded from the batch
//! base seed plus the game index, so a batch is reproducible as a whole
//! while every game still plays out differently.

use crate::game::{
    GameEndReason, GameLoop, PlayerController, RandomController, VerbosityLevel, ZeroController,
};
use crate::loader::{CardDatabase, DeckList, Game};
use crate::Result;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Random,
    Zero,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub games: u32,
    pub base_seed: u64,
    pub max_turns: u32,
    pub starting_life: i32,
    pub controller1: ControllerKind,
    pub controller2: ControllerKind,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            games: 100,
            base_seed: 0,
            max_turns: 100,
            starting_life: 20,
            controller1: ControllerKind::Random,
            controller2: ControllerKind::Random,
        }
    }
}

/// Aggregated results of one deck-versus-deck batch
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MatchStats {
    pub games: u32,
    pub deck1_wins: u32,
    pub deck2_wins: u32,
    pub draws: u32,
    pub total_turns: u64,
}

impl MatchStats {
    pub fn deck1_win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.deck1_wins) / f64::from(self.games)
    }

    pub fn average_turns(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_turns as f64 / f64::from(self.games)
    }

    fn absorb(mut self, other: &MatchStats) -> MatchStats {
        self.games += other.games;
        self.deck1_wins += other.deck1_wins;
        self.deck2_wins += other.deck2_wins;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        self
    }
}

/// Run `config.games` independent games of deck1 versus deck2 in
/// parallel and aggregate the outcomes
pub fn run_batch(
    card_db: &CardDatabase,
    deck1: &DeckList,
    deck2: &DeckList,
    config: &BatchConfig,
) -> Result<MatchStats> {
    let per_game: Vec<MatchStats> = (0..config.games)
        .into_par_iter()
        .map(|index| run_one(card_db, deck1, deck2, config, index))
        .collect::<Result<Vec<_>>>()?;

    Ok(per_game
        .iter()
        .fold(MatchStats::default(), |acc, s| acc.absorb(s)))
}

fn run_one(
    card_db: &CardDatabase,
    deck1: &DeckList,
    deck2: &DeckList,
    config: &BatchConfig,
    index: u32,
) -> Result<MatchStats> {
    let seed = config.base_seed.wrapping_add(u64::from(index));
    let mut builder = Game::new(card_db)
        .with_seed(seed)
        .with_max_turns(config.max_turns)
        .with_starting_life(config.starting_life)
        .with_verbosity(VerbosityLevel::Silent);
    builder.add_player(deck1.name.as_str(), deck1.clone())?;
    builder.add_player(deck2.name.as_str(), deck2.clone())?;

    let mut game = builder.build_state()?;
    let p1 = game.players[0].id;
    let p2 = game.players[1].id;

    let mut c1 = make_controller(config.controller1, p1, seed.wrapping_add(1));
    let mut c2 = make_controller(config.controller2, p2, seed.wrapping_add(2));
    let mut controllers: Vec<&mut dyn PlayerController> =
        vec![c1.as_mut(), c2.as_mut()];

    let result = GameLoop::new(&mut game)
        .with_max_turns(config.max_turns)
        .run_game(&mut controllers)?;

    let mut stats = MatchStats {
        games: 1,
        total_turns: u64::from(result.turns_played),
        ..MatchStats::default()
    };
    match result.winner {
        Some(winner) if winner == p1 => stats.deck1_wins = 1,
        Some(_) => stats.deck2_wins = 1,
        None => {
            debug_assert_eq!(result.end_reason, GameEndReason::TurnLimit);
            stats.draws = 1;
        }
    }
    Ok(stats)
}

fn make_controller(
    kind: ControllerKind,
    player: crate::core::PlayerId,
    seed: u64,
) -> Box<dyn PlayerController> {
    match kind {
        ControllerKind::Random => Box::new(RandomController::new(player, seed)),
        ControllerKind::Zero => Box::new(ZeroController::new(player)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DeckLoader;

    fn deck(content: &str, name: &str) -> DeckList {
        let mut deck = DeckLoader::parse(content).unwrap();
        deck.name = name.to_string();
        deck
    }

    #[test]
    fn test_batch_accounting_adds_up() {
        let db = CardDatabase::demo();
        let green = deck("24 Forest\n36 Grizzly Bears\n", "green");
        let red = deck("24 Mountain\n36 Hill Giant\n", "red");

        let config = BatchConfig {
            games: 8,
            max_turns: 40,
            ..BatchConfig::default()
        };
        let stats = run_batch(&db, &green, &red, &config).unwrap();
        assert_eq!(stats.games, 8);
        assert_eq!(stats.deck1_wins + stats.deck2_wins + stats.draws, 8);
        assert!(stats.average_turns() >= 1.0);
    }

    #[test]
    fn test_batch_is_reproducible() {
        let db = CardDatabase::demo();
        let green = deck("24 Forest\n36 Grizzly Bears\n", "green");
        let red = deck("24 Mountain\n36 Lightning Bolt\n", "red");

        let config = BatchConfig {
            games: 4,
            base_seed: 99,
            max_turns: 30,
            ..BatchConfig::default()
        };
        let a = run_batch(&db, &green, &red, &config).unwrap();
        let b = run_batch(&db, &green, &red, &config).unwrap();
        assert_eq!(a, b);
    }
}
