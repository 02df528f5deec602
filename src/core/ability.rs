//! Structured abilities and effects
//!
//! The upstream text parser turns oracle text into these descriptors; the
//! engine dispatches on them exhaustively and never interprets raw text.

use crate::core::{ManaColor, ManaCost, PermanentId, PlayerId, StackId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What flavor of ability this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Paid cost, goes on the stack
    Activated,
    /// Fires on a game event (consumed by the driver, not player-activated)
    Triggered,
    /// Continuously applies while the source is on the battlefield
    Static,
    /// Paid cost, does NOT use the stack and ignores summoning sickness
    Mana,
}

/// When an ability (or spell) may legally be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    AnyTime,
    SorcerySpeed,
    InstantSpeed,
}

/// Cost to activate an ability: tapping the source, paying mana, or both
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AbilityCost {
    pub tap: bool,
    pub mana: ManaCost,
}

impl AbilityCost {
    pub fn tap_only() -> Self {
        AbilityCost {
            tap: true,
            mana: ManaCost::new(),
        }
    }
}

/// How long an effect's modification lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    Permanent,
    EndOfTurn,
}

/// What kind of object an effect wants targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSpec {
    /// No target; applies to the controller or globally
    None,
    /// Any creature or player
    AnyTarget,
    TargetCreature,
    TargetPlayer,
    /// A spell or ability on the stack (counterspells)
    TargetSpell,
}

/// A target chosen at cast/activation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Player(PlayerId),
    Permanent(PermanentId),
    Spell(StackId),
}

/// A typed effect operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Deal damage to the chosen target
    DealDamage { amount: i32, target: TargetSpec },

    /// Add mana to the controller's pool
    AddMana { colors: SmallVec<[ManaColor; 2]> },

    /// Modify a creature's power/toughness
    ModifyStats {
        power: i32,
        toughness: i32,
        duration: Duration,
        target: TargetSpec,
    },

    /// Controller gains life
    GainLife { amount: i32 },

    /// Controller draws cards
    DrawCards { count: u8 },

    /// Destroy the chosen permanent
    Destroy { target: TargetSpec },

    /// Mark the chosen stack item as countered (takes effect when THIS
    /// spell resolves, not when it is cast)
    CounterSpell,
}

impl Effect {
    /// The target this effect requires the caster to choose, if any
    pub fn target_spec(&self) -> TargetSpec {
        match self {
            Effect::DealDamage { target, .. } => *target,
            Effect::ModifyStats { target, .. } => *target,
            Effect::Destroy { target } => *target,
            Effect::CounterSpell => TargetSpec::TargetSpell,
            Effect::AddMana { .. } | Effect::GainLife { .. } | Effect::DrawCards { .. } => {
                TargetSpec::None
            }
        }
    }
}

/// A structured ability: kind, cost, timing restriction and an ordered
/// list of effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub kind: AbilityKind,
    pub cost: AbilityCost,
    pub timing: Timing,
    pub effects: Vec<Effect>,
}

impl Ability {
    pub fn mana_ability(colors: SmallVec<[ManaColor; 2]>) -> Self {
        Ability {
            kind: AbilityKind::Mana,
            cost: AbilityCost::tap_only(),
            timing: Timing::AnyTime,
            effects: vec![Effect::AddMana { colors }],
        }
    }

    pub fn is_mana_ability(&self) -> bool {
        self.kind == AbilityKind::Mana
    }

    /// Target specs for every effect that needs a chosen target, in order
    pub fn required_targets(&self) -> SmallVec<[TargetSpec; 2]> {
        self.effects
            .iter()
            .map(|e| e.target_spec())
            .filter(|spec| *spec != TargetSpec::None)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_mana_ability_shape() {
        let ability = Ability::mana_ability(smallvec![ManaColor::Green]);
        assert!(ability.is_mana_ability());
        assert!(ability.cost.tap);
        assert!(ability.cost.mana.is_free());
        assert_eq!(ability.timing, Timing::AnyTime);
    }

    #[test]
    fn test_required_targets() {
        let ability = Ability {
            kind: AbilityKind::Activated,
            cost: AbilityCost::tap_only(),
            timing: Timing::InstantSpeed,
            effects: vec![
                Effect::DealDamage {
                    amount: 1,
                    target: TargetSpec::AnyTarget,
                },
                Effect::GainLife { amount: 1 },
            ],
        };
        let targets = ability.required_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0], TargetSpec::AnyTarget);
    }
}
