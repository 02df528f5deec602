//! Player controller trait and game state view
//!
//! The turn driver calls the controller whenever a decision is needed;
//! the controller inspects a read-only view of the game state and picks
//! one of the actions the driver enumerated as legal.

use crate::core::{CardId, PermanentId, PlayerId, Target};
use crate::game::GameState;
use smallvec::SmallVec;

/// Actions a player can take while holding priority
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    /// Play a land card from hand (no stack involved)
    PlayLand(CardId),

    /// Cast a spell from hand with pre-chosen targets
    CastSpell {
        card_id: CardId,
        targets: SmallVec<[Target; 2]>,
    },

    /// Tap a permanent for mana (bypasses the stack)
    TapForMana(PermanentId),

    /// Activate a non-mana activated ability
    ActivateAbility {
        permanent: PermanentId,
        ability_index: usize,
        targets: SmallVec<[Target; 2]>,
    },

    /// Pass priority
    PassPriority,
}

/// Read-only view of game state from one player's perspective
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Cards in this player's hand
    pub fn hand(&self) -> &[CardId] {
        self.game
            .get_player_zones(self.player_id)
            .map(|zones| zones.hand.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn life(&self) -> i32 {
        self.game
            .get_player(self.player_id)
            .map(|p| p.life)
            .unwrap_or(0)
    }

    pub fn opponent(&self) -> Option<PlayerId> {
        self.game.opponent_of(self.player_id).ok()
    }

    pub fn opponent_life(&self) -> i32 {
        self.opponent()
            .and_then(|id| self.game.get_player(id).ok())
            .map(|p| p.life)
            .unwrap_or(0)
    }

    /// This player's creatures
    pub fn creatures(&self) -> &[PermanentId] {
        self.game
            .get_player(self.player_id)
            .map(|p| p.creatures.as_slice())
            .unwrap_or(&[])
    }

    /// Creatures controlled by the opponent
    pub fn opponent_creatures(&self) -> &[PermanentId] {
        self.opponent()
            .and_then(|id| self.game.get_player(id).ok())
            .map(|p| p.creatures.as_slice())
            .unwrap_or(&[])
    }

    pub fn card_name(&self, card_id: CardId) -> Option<&str> {
        self.game
            .cards
            .get(card_id)
            .ok()
            .map(|c| c.data.name.as_str())
    }

    pub fn is_tapped(&self, permanent_id: PermanentId) -> bool {
        self.game
            .permanents
            .get(permanent_id)
            .map(|p| p.tapped)
            .unwrap_or(true)
    }

    pub fn can_play_land(&self) -> bool {
        self.game
            .get_player(self.player_id)
            .map(|p| p.can_play_land())
            .unwrap_or(false)
    }

    /// Total mana currently in the pool
    pub fn available_mana(&self) -> u32 {
        self.game
            .get_player(self.player_id)
            .map(|p| p.mana_pool.total())
            .unwrap_or(0)
    }

    pub fn stack_size(&self) -> usize {
        self.game.stack.len()
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }
}

/// Decision interface between the turn driver and a player (AI or script)
pub trait PlayerController {
    fn player_id(&self) -> PlayerId;

    /// Pick one of the enumerated legal actions, or None to pass priority
    fn choose_action(
        &mut self,
        view: &GameStateView,
        available_actions: &[PlayerAction],
    ) -> Option<PlayerAction>;

    /// Choose which of the legal attackers actually attack
    fn choose_attackers(
        &mut self,
        view: &GameStateView,
        legal_attackers: &[PermanentId],
    ) -> Vec<PermanentId>;

    /// Choose block assignments: (blocker, attacker) pairs drawn from the
    /// given legal pairings
    fn choose_blockers(
        &mut self,
        view: &GameStateView,
        legal_blocks: &[(PermanentId, PermanentId)],
    ) -> Vec<(PermanentId, PermanentId)>;

    /// Called when the game ends
    fn on_game_end(&mut self, _view: &GameStateView, _won: bool) {}
}
