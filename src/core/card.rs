//! Card data: the immutable printed face of a card
//!
//! `CardData` is what the card database hands out; permanents snapshot it
//! when they enter the battlefield.

use crate::core::{Ability, Effect, ManaColor, ManaCost};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

/// A quality a creature can have protection from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionQuality {
    Color(ManaColor),
    Artifacts,
}

/// Keyword abilities the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Lifelink,
    Trample,
    Haste,
    Vigilance,
    Indestructible,
    Flash,
    Defender,
    // Evasion
    Menace,
    Intimidate,
    Shadow,
    Fear,
    Protection(ProtectionQuality),
}

/// Immutable card definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    /// Card name (e.g., "Lightning Bolt")
    pub name: String,

    /// Card types (a card can be multiple types, e.g. artifact creature)
    pub types: SmallVec<[CardType; 2]>,

    /// Colors of the card
    pub colors: SmallVec<[ManaColor; 2]>,

    /// Mana cost
    pub mana_cost: ManaCost,

    /// Keyword abilities
    pub keywords: SmallVec<[Keyword; 4]>,

    /// Structured abilities, produced by the upstream text parser.
    /// The engine dispatches on these and never reads `text`.
    pub abilities: Vec<Ability>,

    /// For instants/sorceries: the effects applied when the spell
    /// resolves (also parser-produced)
    pub spell_effects: Vec<Effect>,

    /// Power (for creatures)
    pub power: Option<i32>,

    /// Toughness (for creatures)
    pub toughness: Option<i32>,

    /// Oracle text, kept for display only
    pub text: String,
}

impl CardData {
    pub fn new(name: impl Into<String>) -> Self {
        CardData {
            name: name.into(),
            types: SmallVec::new(),
            colors: SmallVec::new(),
            mana_cost: ManaCost::new(),
            keywords: SmallVec::new(),
            abilities: Vec::new(),
            spell_effects: Vec::new(),
            power: None,
            toughness: None,
            text: String::new(),
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_artifact(&self) -> bool {
        self.is_type(CardType::Artifact)
    }

    pub fn is_instant(&self) -> bool {
        self.is_type(CardType::Instant)
    }

    /// Does resolving this card put a permanent onto the battlefield?
    pub fn is_permanent_type(&self) -> bool {
        self.types.iter().any(|t| {
            matches!(
                t,
                CardType::Creature
                    | CardType::Enchantment
                    | CardType::Artifact
                    | CardType::Land
                    | CardType::Planeswalker
            )
        })
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn shares_color_with(&self, other: &CardData) -> bool {
        self.colors.iter().any(|c| other.colors.contains(c))
    }
}

/// A card instance owned by a player (in hand, library, graveyard, exile
/// or represented on the stack)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: crate::core::CardId,
    pub owner: crate::core::PlayerId,
    pub data: CardData,
}

impl Card {
    pub fn new(id: crate::core::CardId, owner: crate::core::PlayerId, data: CardData) -> Self {
        Card { id, owner, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_queries() {
        let mut data = CardData::new("Ornithopter");
        data.types.push(CardType::Artifact);
        data.types.push(CardType::Creature);

        assert!(data.is_creature());
        assert!(data.is_artifact());
        assert!(!data.is_land());
        assert!(data.is_permanent_type());

        let mut bolt = CardData::new("Lightning Bolt");
        bolt.types.push(CardType::Instant);
        assert!(!bolt.is_permanent_type());
    }

    #[test]
    fn test_shares_color() {
        let mut a = CardData::new("A");
        a.colors.push(ManaColor::Red);
        a.colors.push(ManaColor::Green);

        let mut b = CardData::new("B");
        b.colors.push(ManaColor::Green);

        let mut c = CardData::new("C");
        c.colors.push(ManaColor::Blue);

        assert!(a.shares_color_with(&b));
        assert!(!a.shares_color_with(&c));
    }

    #[test]
    fn test_protection_keyword() {
        let mut data = CardData::new("White Knight");
        data.keywords
            .push(Keyword::Protection(ProtectionQuality::Color(ManaColor::Black)));

        assert!(data.has_keyword(Keyword::Protection(ProtectionQuality::Color(
            ManaColor::Black
        ))));
        assert!(!data.has_keyword(Keyword::Protection(ProtectionQuality::Color(
            ManaColor::Red
        ))));
    }
}
