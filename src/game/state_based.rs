//! State-based actions
//!
//! After every resolution and every damage step the whole game state is
//! scanned and corrected: lethally damaged creatures die, players at zero
//! or less life lose. The scan is idempotent: running it twice with no
//! intervening change does nothing the second time.

use crate::core::{Keyword, PermanentId};
use crate::game::GameState;
use crate::Result;

impl GameState {
    /// Run one full state-based action scan.
    ///
    /// Returns true if anything changed (a permanent died or a player
    /// lost), so callers can loop until the state is quiescent.
    pub fn check_state_based_actions(&mut self) -> Result<bool> {
        let mut changed = false;

        // Lethally damaged creatures die unless indestructible. Collect
        // first so the scan sees a consistent snapshot.
        let mut dead: Vec<PermanentId> = Vec::new();
        for player in &self.players {
            for id in player.all_permanents() {
                let permanent = self.permanents.get(id)?;
                if permanent.has_lethal_damage() && !permanent.has_keyword(Keyword::Indestructible)
                {
                    dead.push(id);
                }
            }
        }
        for id in dead {
            self.put_in_graveyard(id)?;
            changed = true;
        }

        // Players at zero or less life lose
        for player in &mut self.players {
            if player.life <= 0 && !player.has_lost {
                player.has_lost = true;
                changed = true;
            }
        }
        if changed {
            for player in &self.players {
                if player.has_lost {
                    self.logger
                        .minimal(&format!("{} has lost the game", player.name));
                }
            }
        }

        Ok(changed)
    }
}
