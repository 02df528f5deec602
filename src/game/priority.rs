//! Priority tracking
//!
//! Tracks which player must act, and turns consecutive passes into
//! resolution or step-end signals. The turn driver acts on the returned
//! outcome; this module never touches the stack itself.

use crate::core::PlayerId;
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};

/// What a priority pass means for the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Priority moved to the other player; keep waiting for actions
    Waiting,
    /// Both players passed with a non-empty stack: resolve the top item
    ResolveTop,
    /// Both players passed on an empty stack: the current step ends
    StepEnds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityManager {
    /// Active player (receives priority first and after every action)
    active: PlayerId,

    /// The other player
    nonactive: PlayerId,

    /// Player who currently holds priority
    holder: PlayerId,

    consecutive_passes: u8,
}

impl PriorityManager {
    pub fn new(active: PlayerId, nonactive: PlayerId) -> Self {
        PriorityManager {
            active,
            nonactive,
            holder: active,
            consecutive_passes: 0,
        }
    }

    pub fn holder(&self) -> PlayerId {
        self.holder
    }

    pub fn active_player(&self) -> PlayerId {
        self.active
    }

    /// Start a new step/turn segment: active player gets priority
    pub fn begin_step(&mut self, active: PlayerId, nonactive: PlayerId) {
        self.active = active;
        self.nonactive = nonactive;
        self.holder = active;
        self.consecutive_passes = 0;
    }

    /// A player took an action (cast, activated). Priority returns to the
    /// given player and the pass count resets.
    pub fn note_action(&mut self, player: PlayerId) {
        self.holder = player;
        self.consecutive_passes = 0;
    }

    /// Priority returns to the active player (after a resolution)
    pub fn reset_after_resolution(&mut self) {
        self.holder = self.active;
        self.consecutive_passes = 0;
    }

    /// The holder passes priority.
    ///
    /// Errors if `player` does not hold priority. `stack_empty` tells the
    /// manager whether a double-pass resolves the top item or ends the
    /// step.
    pub fn pass_priority(&mut self, player: PlayerId, stack_empty: bool) -> Result<PassOutcome> {
        if player != self.holder {
            return Err(SimError::InvalidAction(format!(
                "player {player} passed priority without holding it (holder: {})",
                self.holder
            )));
        }

        self.consecutive_passes += 1;
        if self.consecutive_passes >= 2 {
            self.consecutive_passes = 0;
            self.holder = self.active;
            if stack_empty {
                Ok(PassOutcome::StepEnds)
            } else {
                Ok(PassOutcome::ResolveTop)
            }
        } else {
            self.holder = if player == self.active {
                self.nonactive
            } else {
                self.active
            };
            Ok(PassOutcome::Waiting)
        }
    }
}
