//! Zero controller: always takes the first meaningful action
//!
//! Deterministic and stateless; two zero controllers produce the exact
//! same game every run, which makes it the reference opponent for
//! replay and regression tests.

use crate::core::{PermanentId, PlayerId};
use crate::game::controller::{GameStateView, PlayerAction, PlayerController};

pub struct ZeroController {
    player_id: PlayerId,
}

impl ZeroController {
    pub fn new(player_id: PlayerId) -> Self {
        ZeroController { player_id }
    }
}

impl PlayerController for ZeroController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn choose_action(
        &mut self,
        _view: &GameStateView,
        available_actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        available_actions
            .iter()
            .find(|a| !matches!(a, PlayerAction::PassPriority))
            .cloned()
    }

    fn choose_attackers(
        &mut self,
        _view: &GameStateView,
        legal_attackers: &[PermanentId],
    ) -> Vec<PermanentId> {
        // Attack with everything
        legal_attackers.to_vec()
    }

    fn choose_blockers(
        &mut self,
        _view: &GameStateView,
        legal_blocks: &[(PermanentId, PermanentId)],
    ) -> Vec<(PermanentId, PermanentId)> {
        // Block one-for-one, first legal pairing per blocker
        let mut used = Vec::new();
        let mut chosen = Vec::new();
        for &(blocker, attacker) in legal_blocks {
            if !used.contains(&blocker) {
                used.push(blocker);
                chosen.push((blocker, attacker));
            }
        }
        chosen
    }
}
