//! Player representation
//!
//! A player owns a life total, a mana pool, and battlefield subsets
//! grouped by permanent kind. Card zones (hand/library/graveyard/exile)
//! live in [`crate::zones`]. Opponents are referenced by ID only.

use crate::core::{ManaPool, PermanentId, PermanentKind, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    pub name: String,

    /// Life total; may go negative, signaling loss
    pub life: i32,

    pub mana_pool: ManaPool,

    pub has_lost: bool,

    // Battlefield subsets by permanent kind (unordered)
    pub creatures: Vec<PermanentId>,
    pub lands: Vec<PermanentId>,
    pub artifacts: Vec<PermanentId>,
    pub enchantments: Vec<PermanentId>,
    pub planeswalkers: Vec<PermanentId>,

    /// Lands played this turn
    pub lands_played_this_turn: u8,

    /// Maximum lands per turn (usually 1)
    pub max_lands_per_turn: u8,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
            has_lost: false,
            creatures: Vec::new(),
            lands: Vec::new(),
            artifacts: Vec::new(),
            enchantments: Vec::new(),
            planeswalkers: Vec::new(),
            lands_played_this_turn: 0,
            max_lands_per_turn: 1,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
    }

    pub fn battlefield(&self, kind: PermanentKind) -> &Vec<PermanentId> {
        match kind {
            PermanentKind::Creature => &self.creatures,
            PermanentKind::Land => &self.lands,
            PermanentKind::Artifact => &self.artifacts,
            PermanentKind::Enchantment => &self.enchantments,
            PermanentKind::Planeswalker => &self.planeswalkers,
        }
    }

    pub fn battlefield_mut(&mut self, kind: PermanentKind) -> &mut Vec<PermanentId> {
        match kind {
            PermanentKind::Creature => &mut self.creatures,
            PermanentKind::Land => &mut self.lands,
            PermanentKind::Artifact => &mut self.artifacts,
            PermanentKind::Enchantment => &mut self.enchantments,
            PermanentKind::Planeswalker => &mut self.planeswalkers,
        }
    }

    /// All permanents this player controls, creatures first
    pub fn all_permanents(&self) -> impl Iterator<Item = PermanentId> + '_ {
        self.creatures
            .iter()
            .chain(self.lands.iter())
            .chain(self.artifacts.iter())
            .chain(self.enchantments.iter())
            .chain(self.planeswalkers.iter())
            .copied()
    }

    /// Remove a permanent ID from whichever subset holds it
    pub fn remove_permanent(&mut self, id: PermanentId) -> bool {
        for subset in [
            &mut self.creatures,
            &mut self.lands,
            &mut self.artifacts,
            &mut self.enchantments,
            &mut self.planeswalkers,
        ] {
            if let Some(pos) = subset.iter().position(|&p| p == id) {
                subset.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn can_play_land(&self) -> bool {
        self.lands_played_this_turn < self.max_lands_per_turn
    }

    pub fn note_land_played(&mut self) {
        self.lands_played_this_turn += 1;
    }

    pub fn reset_lands_played(&mut self) {
        self.lands_played_this_turn = 0;
    }

    pub fn empty_mana_pool(&mut self) {
        self.mana_pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_player_creation() {
        let player = Player::new(EntityId::new(1), "Alice", 20);
        assert_eq!(player.life, 20);
        assert!(!player.has_lost);
        assert!(player.creatures.is_empty());
    }

    #[test]
    fn test_life_can_go_negative() {
        let mut player = Player::new(EntityId::new(1), "Bob", 20);
        player.lose_life(25);
        assert_eq!(player.life, -5);
        // has_lost is set by the state-based action checker, not here
        assert!(!player.has_lost);
    }

    #[test]
    fn test_battlefield_subsets() {
        let mut player = Player::new(EntityId::new(1), "Carol", 20);
        let c1: PermanentId = EntityId::new(10);
        let l1: PermanentId = EntityId::new(11);

        player.battlefield_mut(PermanentKind::Creature).push(c1);
        player.battlefield_mut(PermanentKind::Land).push(l1);

        assert_eq!(player.all_permanents().count(), 2);
        assert!(player.remove_permanent(c1));
        assert!(!player.remove_permanent(c1));
        assert_eq!(player.all_permanents().count(), 1);
    }

    #[test]
    fn test_land_playing() {
        let mut player = Player::new(EntityId::new(1), "Dave", 20);
        assert!(player.can_play_land());
        player.note_land_played();
        assert!(!player.can_play_land());
        player.reset_lands_played();
        assert!(player.can_play_land());
    }
}
