//! Per-player card zones
//!
//! Only the ordered card collections live here: library, hand,
//! graveyard and exile. Battlefield presence is a `Permanent` in the
//! owner's subset, and the stack keeps its own order in
//! [`crate::game::stack`].

use crate::core::{CardId, PlayerId};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// The four ordered zones a card can sit in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Library,
    Hand,
    Graveyard,
    Exile,
}

/// One zone's cards, oldest first. For a library the top of the deck is
/// the last element, so drawing is a pop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub kind: Zone,
    pub owner: PlayerId,
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(kind: Zone, owner: PlayerId) -> Self {
        CardZone {
            kind,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card: CardId) {
        self.cards.push(card);
    }

    /// Remove one card, keeping the order of the rest intact. Swap
    /// removal would make replays depend on removal history rather than
    /// the seed alone.
    pub fn remove(&mut self, card: CardId) -> bool {
        match self.cards.iter().position(|&c| c == card) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards.iter().any(|&c| c == card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        self.cards.shuffle(rng);
    }
}

/// A player's four zones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: CardZone,
    pub hand: CardZone,
    pub graveyard: CardZone,
    pub exile: CardZone,
}

impl PlayerZones {
    pub fn new(owner: PlayerId) -> Self {
        let zone = |kind| CardZone::new(kind, owner);
        PlayerZones {
            library: zone(Zone::Library),
            hand: zone(Zone::Hand),
            graveyard: zone(Zone::Graveyard),
            exile: zone(Zone::Exile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn cards(ids: &[u32]) -> Vec<CardId> {
        ids.iter().map(|&n| EntityId::new(n)).collect()
    }

    #[test]
    fn removal_keeps_relative_order() {
        let mut zone = CardZone::new(Zone::Graveyard, EntityId::new(0));
        for card in cards(&[3, 4, 5, 6]) {
            zone.add(card);
        }
        assert!(zone.remove(EntityId::new(4)));
        assert!(!zone.remove(EntityId::new(4)));
        assert_eq!(zone.cards, cards(&[3, 5, 6]));
        assert!(zone.contains(EntityId::new(5)));
        assert_eq!(zone.len(), 3);
    }

    #[test]
    fn draw_comes_off_the_top() {
        let mut library = CardZone::new(Zone::Library, EntityId::new(0));
        for card in cards(&[10, 11, 12]) {
            library.add(card);
        }
        assert_eq!(library.peek_top(), Some(EntityId::new(12)));
        assert_eq!(library.draw_top(), Some(EntityId::new(12)));
        assert_eq!(library.draw_top(), Some(EntityId::new(11)));
        assert_eq!(library.draw_top(), Some(EntityId::new(10)));
        assert!(library.is_empty());
        assert_eq!(library.draw_top(), None);
    }

    #[test]
    fn shuffle_is_seed_stable() {
        let owner: PlayerId = EntityId::new(1);
        let deal = |seed| {
            let mut library = CardZone::new(Zone::Library, owner);
            library.cards = cards(&[0, 1, 2, 3, 4, 5, 6, 7]);
            library.shuffle(&mut ChaCha12Rng::seed_from_u64(seed));
            library.cards
        };
        assert_eq!(deal(9), deal(9));
        assert_ne!(deal(9), deal(10));
    }

    #[test]
    fn fresh_zones_are_empty_and_owned() {
        let owner: PlayerId = EntityId::new(2);
        let zones = PlayerZones::new(owner);
        for zone in [&zones.library, &zones.hand, &zones.graveyard, &zones.exile] {
            assert!(zone.is_empty());
            assert_eq!(zone.owner, owner);
        }
        assert_eq!(zones.hand.kind, Zone::Hand);
    }
}
