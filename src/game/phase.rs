//! Turn structure: the fixed sequence of steps a turn walks through

use crate::core::PlayerId;
use serde::{Deserialize, Serialize};

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PreCombatMain,
    Combat,
    PostCombatMain,
    Ending,
}

/// Steps of a turn. Variants are declared in turn order so the
/// discriminant doubles as an index into [`TURN_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

/// Every step of a turn, first to last
pub const TURN_ORDER: [Step; 12] = [
    Step::Untap,
    Step::Upkeep,
    Step::Draw,
    Step::Main1,
    Step::BeginCombat,
    Step::DeclareAttackers,
    Step::DeclareBlockers,
    Step::CombatDamage,
    Step::EndCombat,
    Step::Main2,
    Step::End,
    Step::Cleanup,
];

impl Step {
    pub fn phase(self) -> Phase {
        use Step::*;
        match self {
            Untap | Upkeep | Draw => Phase::Beginning,
            Main1 => Phase::PreCombatMain,
            Main2 => Phase::PostCombatMain,
            End | Cleanup => Phase::Ending,
            BeginCombat | DeclareAttackers | DeclareBlockers | CombatDamage | EndCombat => {
                Phase::Combat
            }
        }
    }

    /// Step that follows this one, or None after Cleanup
    pub fn next(self) -> Option<Step> {
        TURN_ORDER.get(self as usize + 1).copied()
    }

    /// Main-phase windows, where sorcery-speed spells are legal
    pub fn is_sorcery_speed(self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Land drops share the sorcery-speed windows
    pub fn can_play_lands(self) -> bool {
        self.is_sorcery_speed()
    }

    /// Short name for log lines
    pub fn label(self) -> &'static str {
        match self {
            Step::Untap => "untap",
            Step::Upkeep => "upkeep",
            Step::Draw => "draw",
            Step::Main1 => "first main",
            Step::BeginCombat => "begin combat",
            Step::DeclareAttackers => "declare attackers",
            Step::DeclareBlockers => "declare blockers",
            Step::CombatDamage => "combat damage",
            Step::EndCombat => "end of combat",
            Step::Main2 => "second main",
            Step::End => "end",
            Step::Cleanup => "cleanup",
        }
    }
}

/// Where the game stands within the current turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// One-based turn counter
    pub turn_number: u32,

    pub current_step: Step,

    /// Player whose turn it is
    pub active_player: PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            active_player: starting_player,
            turn_number: 1,
            current_step: TURN_ORDER[0],
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_step.phase()
    }

    /// Move to the following step. Returns false once the turn is spent
    /// and [`TurnStructure::next_turn`] is due.
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                true
            }
            None => false,
        }
    }

    /// Hand the turn to `next_player`, rewinding to the untap step
    pub fn next_turn(&mut self, next_player: PlayerId) {
        self.active_player = next_player;
        self.turn_number += 1;
        self.current_step = TURN_ORDER[0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn turn_order_matches_next_links() {
        for pair in TURN_ORDER.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Step::Cleanup.next(), None);
    }

    #[test]
    fn phases_form_contiguous_runs() {
        let mut seen = vec![TURN_ORDER[0].phase()];
        for step in &TURN_ORDER[1..] {
            let phase = step.phase();
            if *seen.last().unwrap() != phase {
                assert!(!seen.contains(&phase), "{phase:?} appears twice");
                seen.push(phase);
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn exactly_two_sorcery_windows() {
        let mains = TURN_ORDER.iter().filter(|s| s.is_sorcery_speed()).count();
        assert_eq!(mains, 2);
        assert!(Step::Main1.can_play_lands());
        assert!(!Step::Upkeep.is_sorcery_speed());
        assert!(!Step::DeclareBlockers.is_sorcery_speed());
    }

    #[test]
    fn turn_hand_off_rewinds_to_untap() {
        let p1: PlayerId = EntityId::new(0);
        let p2: PlayerId = EntityId::new(1);
        let mut turn = TurnStructure::new(p1);
        assert_eq!(turn.current_phase(), Phase::Beginning);

        let mut count = 1;
        while turn.advance_step() {
            count += 1;
        }
        assert_eq!(count, TURN_ORDER.len());
        assert_eq!(turn.current_step, Step::Cleanup);
        assert!(!turn.advance_step());

        turn.next_turn(p2);
        assert_eq!(turn.turn_number, 2);
        assert_eq!(turn.current_step, Step::Untap);
        assert_eq!(turn.active_player, p2);
    }
}
