//! Random controller: baseline AI that picks uniformly among legal moves
//!
//! Useful for statistical deck evaluation (many random games approximate
//! a deck's raw power) and as a fuzzing driver for the engine.

use crate::core::{PermanentId, PlayerId};
use crate::game::controller::{GameStateView, PlayerAction, PlayerController};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Picks randomly from available actions, with a bias toward acting over
/// passing so games make progress
pub struct RandomController {
    player_id: PlayerId,
    rng: ChaCha12Rng,
    /// Probability (percent) of passing even when actions are available
    pass_chance: u8,
}

impl RandomController {
    pub fn new(player_id: PlayerId, seed: u64) -> Self {
        RandomController {
            player_id,
            rng: ChaCha12Rng::seed_from_u64(seed),
            pass_chance: 10,
        }
    }
}

impl PlayerController for RandomController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn choose_action(
        &mut self,
        _view: &GameStateView,
        available_actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        if available_actions.is_empty() || self.rng.gen_range(0..100) < self.pass_chance {
            return None;
        }
        let index = self.rng.gen_range(0..available_actions.len());
        Some(available_actions[index].clone())
    }

    fn choose_attackers(
        &mut self,
        _view: &GameStateView,
        legal_attackers: &[PermanentId],
    ) -> Vec<PermanentId> {
        legal_attackers
            .iter()
            .filter(|_| self.rng.gen_bool(0.5))
            .copied()
            .collect()
    }

    fn choose_blockers(
        &mut self,
        _view: &GameStateView,
        legal_blocks: &[(PermanentId, PermanentId)],
    ) -> Vec<(PermanentId, PermanentId)> {
        // Each blocker appears in at most one chosen pair
        let mut used = Vec::new();
        let mut chosen = Vec::new();
        for &(blocker, attacker) in legal_blocks {
            if !used.contains(&blocker) && self.rng.gen_bool(0.5) {
                used.push(blocker);
                chosen.push((blocker, attacker));
            }
        }
        chosen
    }
}
