//! Permanents: physical objects on the battlefield
//!
//! A permanent snapshots its card data on entry and carries all mutable
//! battlefield state: tap status, marked damage, combat assignments.
//! Combat references (who it attacks, what blocks it) are IDs resolved
//! through the game's permanent arena, never direct references.

use crate::core::{CardData, CardId, Keyword, ManaColor, PermanentId, PlayerId, ProtectionQuality};
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Primary classification used for a player's battlefield subsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermanentKind {
    Creature,
    Land,
    Artifact,
    Enchantment,
    Planeswalker,
}

/// A permanent on the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permanent {
    /// Stable identity for the lifetime of the game
    pub id: PermanentId,

    /// Owning player; destruction moves the underlying card to this
    /// player's graveyard
    pub owner: PlayerId,

    /// The card this permanent was created from
    pub card_id: CardId,

    /// Printed face, snapshotted at entry
    pub card: CardData,

    /// Current base power/toughness (printed values at entry)
    pub power: i32,
    pub toughness: i32,

    /// Until-end-of-turn stat modifications
    pub power_bonus: i32,
    pub toughness_bonus: i32,

    /// Damage marked this turn
    pub damage: i32,

    /// Whether any of the marked damage came from a deathtouch source
    pub deathtouched: bool,

    pub tapped: bool,

    /// Set on entry for creatures; cleared at the controller's next untap
    pub summoning_sick: bool,

    /// Mana categories this permanent can produce by tapping (empty for
    /// non-producers)
    pub produces: SmallVec<[ManaColor; 2]>,

    /// Player this creature is attacking, if any
    pub attacking: Option<PlayerId>,

    /// Attacker this creature is blocking, if any
    pub blocking: Option<PermanentId>,

    /// Creatures blocking this attacker
    pub blocked_by: SmallVec<[PermanentId; 4]>,

    /// Forced to attack by an external effect
    pub goaded: bool,
}

impl Permanent {
    pub fn from_card(id: PermanentId, card_id: CardId, owner: PlayerId, card: CardData) -> Self {
        let power = card.power.unwrap_or(0);
        let toughness = card.toughness.unwrap_or(0);
        let summoning_sick = card.is_creature();
        let produces = card
            .abilities
            .iter()
            .filter(|a| a.is_mana_ability())
            .flat_map(|a| {
                a.effects.iter().filter_map(|e| match e {
                    crate::core::Effect::AddMana { colors } => Some(colors.clone()),
                    _ => None,
                })
            })
            .flatten()
            .collect();

        Permanent {
            id,
            owner,
            card_id,
            card,
            power,
            toughness,
            power_bonus: 0,
            toughness_bonus: 0,
            damage: 0,
            deathtouched: false,
            tapped: false,
            summoning_sick,
            produces,
            attacking: None,
            blocking: None,
            blocked_by: SmallVec::new(),
            goaded: false,
        }
    }

    pub fn kind(&self) -> PermanentKind {
        use crate::core::CardType;
        if self.card.is_creature() {
            PermanentKind::Creature
        } else if self.card.is_land() {
            PermanentKind::Land
        } else if self.card.is_type(CardType::Planeswalker) {
            PermanentKind::Planeswalker
        } else if self.card.is_artifact() {
            PermanentKind::Artifact
        } else {
            PermanentKind::Enchantment
        }
    }

    pub fn is_creature(&self) -> bool {
        self.card.is_creature()
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.card.has_keyword(keyword)
    }

    /// Protection quality matched by the given blocker, if any
    pub fn protection_against(&self, other: &Permanent) -> Option<ProtectionQuality> {
        self.card.keywords.iter().find_map(|k| match k {
            Keyword::Protection(quality) => {
                let matches = match quality {
                    ProtectionQuality::Color(color) => other.card.colors.contains(color),
                    ProtectionQuality::Artifacts => other.card.is_artifact(),
                };
                matches.then_some(*quality)
            }
            _ => None,
        })
    }

    pub fn current_power(&self) -> i32 {
        self.power + self.power_bonus
    }

    pub fn current_toughness(&self) -> i32 {
        self.toughness + self.toughness_bonus
    }

    /// Tap this permanent. Tapping an already-tapped permanent is a rules
    /// violation and reported as an error, never silently ignored.
    pub fn tap(&mut self) -> Result<()> {
        if self.tapped {
            return Err(SimError::InvalidAction(format!(
                "{} is already tapped",
                self.card.name
            )));
        }
        self.tapped = true;
        Ok(())
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    pub fn is_mana_producer(&self) -> bool {
        !self.produces.is_empty()
    }

    /// Marked damage meets or exceeds toughness, or any deathtouch damage
    /// was marked. Indestructible is checked by the state-based action
    /// scan, not here.
    pub fn has_lethal_damage(&self) -> bool {
        if !self.is_creature() {
            return false;
        }
        self.damage >= self.current_toughness() || (self.deathtouched && self.damage > 0)
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking.is_some()
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking.is_some()
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Reset all combat-assignment state (end of combat, or on leaving
    /// the battlefield)
    pub fn clear_combat(&mut self) {
        self.attacking = None;
        self.blocking = None;
        self.blocked_by.clear();
    }

    /// Clear marked damage and until-end-of-turn modifications (cleanup step)
    pub fn cleanup_turn(&mut self) {
        self.damage = 0;
        self.deathtouched = false;
        self.power_bonus = 0;
        self.toughness_bonus = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardType, EntityId};
    use smallvec::smallvec;

    fn creature(name: &str, power: i32, toughness: i32) -> Permanent {
        let mut data = CardData::new(name);
        data.types.push(CardType::Creature);
        data.power = Some(power);
        data.toughness = Some(toughness);
        Permanent::from_card(EntityId::new(1), EntityId::new(2), EntityId::new(0), data)
    }

    #[test]
    fn test_tap_twice_is_error() {
        let mut c = creature("Bear", 2, 2);
        assert!(c.tap().is_ok());
        assert!(c.tap().is_err());
        c.untap();
        assert!(c.tap().is_ok());
    }

    #[test]
    fn test_summoning_sickness_only_for_creatures() {
        let c = creature("Bear", 2, 2);
        assert!(c.summoning_sick);

        let mut land = CardData::new("Forest");
        land.types.push(CardType::Land);
        let p = Permanent::from_card(
            EntityId::new(3),
            EntityId::new(4),
            EntityId::new(0),
            land,
        );
        assert!(!p.summoning_sick);
    }

    #[test]
    fn test_lethal_damage() {
        let mut c = creature("Bear", 2, 2);
        assert!(!c.has_lethal_damage());
        c.damage = 2;
        assert!(c.has_lethal_damage());

        let mut d = creature("Hill Giant", 3, 3);
        d.damage = 1;
        assert!(!d.has_lethal_damage());
        d.deathtouched = true;
        assert!(d.has_lethal_damage());
    }

    #[test]
    fn test_produces_from_mana_ability() {
        let mut data = CardData::new("Forest");
        data.types.push(CardType::Land);
        data.abilities
            .push(crate::core::Ability::mana_ability(smallvec![ManaColor::Green]));
        let p = Permanent::from_card(
            EntityId::new(1),
            EntityId::new(2),
            EntityId::new(0),
            data,
        );
        assert!(p.is_mana_producer());
        assert_eq!(p.produces.as_slice(), &[ManaColor::Green]);
    }

    #[test]
    fn test_protection_matching() {
        let mut knight_data = CardData::new("Black Knight");
        knight_data.types.push(CardType::Creature);
        knight_data.colors.push(ManaColor::Black);
        knight_data.power = Some(2);
        knight_data.toughness = Some(2);
        knight_data
            .keywords
            .push(Keyword::Protection(ProtectionQuality::Color(ManaColor::White)));
        let knight = Permanent::from_card(
            EntityId::new(1),
            EntityId::new(2),
            EntityId::new(0),
            knight_data,
        );

        let mut angel_data = CardData::new("Angel");
        angel_data.types.push(CardType::Creature);
        angel_data.colors.push(ManaColor::White);
        angel_data.power = Some(4);
        angel_data.toughness = Some(4);
        let angel = Permanent::from_card(
            EntityId::new(3),
            EntityId::new(4),
            EntityId::new(0),
            angel_data,
        );

        assert!(knight.protection_against(&angel).is_some());
        assert!(angel.protection_against(&knight).is_none());
    }
}
