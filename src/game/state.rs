//! Main game state structure

use crate::core::{
    Card, CardData, CardId, EntityId, EntityStore, ManaColor, Permanent, PermanentId, Player,
    PlayerId, StackId,
};
use crate::game::logger::GameLogger;
use crate::game::priority::PriorityManager;
use crate::game::stack::Stack;
use crate::game::TurnStructure;
use crate::zones::PlayerZones;
use crate::{Result, SimError};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Complete state of one game
///
/// Holds every entity arena, both players, the stack and the turn
/// structure. One game owns its state exclusively; batch simulation runs
/// many independent `GameState`s in parallel with no sharing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All card instances in the game
    pub cards: EntityStore<Card>,

    /// Arena of battlefield permanents, indexed by stable ID
    pub permanents: EntityStore<Permanent>,

    /// Both players (Vec for stable ordering)
    pub players: Vec<Player>,

    /// Card zones for each player
    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// Pending spells and abilities
    pub stack: Stack,

    /// Who holds priority
    pub priority: PriorityManager,

    /// Turn/phase structure
    pub turn: TurnStructure,

    /// Seeded RNG for deterministic replay. RefCell so controllers can
    /// draw randomness through a shared view of the state.
    pub rng: RefCell<ChaCha12Rng>,

    /// Unified entity ID generator (cards, permanents, stack items)
    next_entity_id: u32,

    /// Game event logger
    #[serde(skip)]
    pub logger: GameLogger,
}

impl GameState {
    pub fn new_two_player(
        player1_name: impl Into<String>,
        player2_name: impl Into<String>,
        starting_life: i32,
    ) -> Self {
        let p1_id: PlayerId = EntityId::new(0);
        let p2_id: PlayerId = EntityId::new(1);

        let players = vec![
            Player::new(p1_id, player1_name, starting_life),
            Player::new(p2_id, player2_name, starting_life),
        ];
        let player_zones = vec![
            (p1_id, PlayerZones::new(p1_id)),
            (p2_id, PlayerZones::new(p2_id)),
        ];

        GameState {
            cards: EntityStore::new(),
            permanents: EntityStore::new(),
            players,
            player_zones,
            stack: Stack::new(),
            priority: PriorityManager::new(p1_id, p2_id),
            turn: TurnStructure::new(p1_id),
            rng: RefCell::new(ChaCha12Rng::seed_from_u64(0)),
            next_entity_id: 2,
            logger: GameLogger::new(),
        }
    }

    /// Reseed the RNG for deterministic gameplay
    pub fn seed_rng(&mut self, seed: u64) {
        *self.rng.borrow_mut() = ChaCha12Rng::seed_from_u64(seed);
    }

    fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn next_card_id(&mut self) -> CardId {
        self.next_id()
    }

    pub fn next_permanent_id(&mut self) -> PermanentId {
        self.next_id()
    }

    pub fn next_stack_id(&mut self) -> StackId {
        self.next_id()
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    /// The other player in a two-player game (non-owning lookup)
    pub fn opponent_of(&self, player_id: PlayerId) -> Result<PlayerId> {
        self.players
            .iter()
            .find(|p| p.id != player_id)
            .map(|p| p.id)
            .ok_or(SimError::InvalidAction("no opponent found".to_string()))
    }

    pub fn get_player_zones(&self, player_id: PlayerId) -> Result<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
            .ok_or(SimError::EntityNotFound(player_id.as_u32()))
    }

    pub fn get_player_zones_mut(&mut self, player_id: PlayerId) -> Result<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
            .ok_or(SimError::EntityNotFound(player_id.as_u32()))
    }

    /// Create a card instance owned by a player and put it in their library
    pub fn add_card_to_library(&mut self, owner: PlayerId, data: CardData) -> Result<CardId> {
        let card_id = self.next_card_id();
        self.cards.insert(card_id, Card::new(card_id, owner, data));
        self.get_player_zones_mut(owner)?.library.add(card_id);
        Ok(card_id)
    }

    pub fn shuffle_library(&mut self, player_id: PlayerId) -> Result<()> {
        let rng = &self.rng;
        let zones = self
            .player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
            .ok_or(SimError::EntityNotFound(player_id.as_u32()))?;
        zones.library.shuffle(&mut *rng.borrow_mut());
        Ok(())
    }

    /// Draw a card; None if the library is empty (the driver treats that
    /// as a loss)
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        let zones = self.get_player_zones_mut(player_id)?;
        if let Some(card_id) = zones.library.draw_top() {
            zones.hand.add(card_id);
            Ok(Some(card_id))
        } else {
            Ok(None)
        }
    }

    /// Play a land from hand: a simple zone operation, no stack involved
    pub fn play_land(&mut self, player_id: PlayerId, card_id: CardId) -> Result<PermanentId> {
        let card = self.cards.get(card_id)?;
        if !card.data.is_land() {
            return Err(SimError::InvalidAction(format!(
                "{} is not a land",
                card.data.name
            )));
        }
        if !self.get_player(player_id)?.can_play_land() {
            return Err(SimError::InvalidAction(
                "already played a land this turn".to_string(),
            ));
        }
        if !self.get_player_zones(player_id)?.hand.contains(card_id) {
            return Err(SimError::InvalidAction("land not in hand".to_string()));
        }

        self.get_player_zones_mut(player_id)?.hand.remove(card_id);
        let permanent_id = self.enter_battlefield(card_id, player_id)?;
        self.get_player_mut(player_id)?.note_land_played();
        Ok(permanent_id)
    }

    /// Create a permanent from a card and add it to the owner's
    /// battlefield subset
    pub fn enter_battlefield(&mut self, card_id: CardId, owner: PlayerId) -> Result<PermanentId> {
        let data = self.cards.get(card_id)?.data.clone();
        let permanent_id = self.next_permanent_id();
        let permanent = Permanent::from_card(permanent_id, card_id, owner, data);
        let kind = permanent.kind();
        self.permanents.insert(permanent_id, permanent);
        self.get_player_mut(owner)?
            .battlefield_mut(kind)
            .push(permanent_id);
        Ok(permanent_id)
    }

    /// Move a permanent to its owner's graveyard unconditionally.
    ///
    /// Callers are responsible for the indestructible check; use
    /// [`GameState::destroy_permanent`] for effect-driven destruction.
    pub fn put_in_graveyard(&mut self, permanent_id: PermanentId) -> Result<()> {
        let (owner, card_id, name) = {
            let p = self.permanents.get(permanent_id)?;
            (p.owner, p.card_id, p.card.name.clone())
        };

        self.get_player_mut(owner)?.remove_permanent(permanent_id);
        self.permanents.remove(permanent_id);
        self.clear_combat_references(permanent_id);
        self.get_player_zones_mut(owner)?.graveyard.add(card_id);
        self.logger.normal(&format!("{name} dies"));
        Ok(())
    }

    /// Destroy a permanent unless it is indestructible
    pub fn destroy_permanent(&mut self, permanent_id: PermanentId) -> Result<()> {
        let indestructible = self
            .permanents
            .get(permanent_id)?
            .has_keyword(crate::core::Keyword::Indestructible);
        if indestructible {
            return Ok(());
        }
        self.put_in_graveyard(permanent_id)
    }

    /// Strip combat references to a permanent that left the battlefield
    fn clear_combat_references(&mut self, gone: PermanentId) {
        let ids: Vec<u32> = self.permanents.iter().map(|(id, _)| id).collect();
        for raw in ids {
            let id: PermanentId = EntityId::new(raw);
            if let Ok(p) = self.permanents.get_mut(id) {
                if p.blocking == Some(gone) {
                    p.blocking = None;
                }
                p.blocked_by.retain(|&mut b| b != gone);
            }
        }
    }

    /// Activate a permanent's mana ability: taps the source and adds its
    /// produced mana. Mana abilities bypass the stack and ignore
    /// summoning sickness.
    pub fn tap_for_mana(&mut self, player_id: PlayerId, permanent_id: PermanentId) -> Result<()> {
        let colors = {
            let permanent = self.permanents.get_mut(permanent_id)?;
            if permanent.owner != player_id {
                return Err(SimError::InvalidAction(
                    "cannot tap an opponent's permanent for mana".to_string(),
                ));
            }
            if !permanent.is_mana_producer() {
                return Err(SimError::InvalidAction(format!(
                    "{} does not produce mana",
                    permanent.card.name
                )));
            }
            permanent.tap()?;
            permanent.produces.clone()
        };

        // Fixed producers add their first category; "any color" producers
        // are represented by the parser as multi-entry lists and default
        // to the first listed category when untargeted.
        if let Some(&color) = colors.first() {
            self.add_mana(player_id, color, 1)?;
        }
        Ok(())
    }

    pub fn add_mana(&mut self, player_id: PlayerId, color: ManaColor, amount: u8) -> Result<()> {
        self.get_player_mut(player_id)?.mana_pool.add(color, amount);
        Ok(())
    }

    /// Untap step: untap the active player's permanents and clear their
    /// summoning sickness
    pub fn untap_step(&mut self, player_id: PlayerId) -> Result<()> {
        let ids: Vec<PermanentId> = self.get_player(player_id)?.all_permanents().collect();
        for id in ids {
            let p = self.permanents.get_mut(id)?;
            p.untap();
            p.summoning_sick = false;
        }
        Ok(())
    }

    /// Clear combat assignments on every permanent (end of combat phase)
    pub fn end_of_combat_cleanup(&mut self) {
        let ids: Vec<u32> = self.permanents.iter().map(|(id, _)| id).collect();
        for raw in ids {
            let id: PermanentId = EntityId::new(raw);
            if let Ok(p) = self.permanents.get_mut(id) {
                p.clear_combat();
            }
        }
    }

    /// Cleanup step: damage wears off, until-end-of-turn effects expire,
    /// mana pools empty
    pub fn cleanup_step(&mut self) {
        let ids: Vec<u32> = self.permanents.iter().map(|(id, _)| id).collect();
        for raw in ids {
            let id: PermanentId = EntityId::new(raw);
            if let Ok(p) = self.permanents.get_mut(id) {
                p.cleanup_turn();
            }
        }
        for player in &mut self.players {
            player.empty_mana_pool();
        }
    }

    pub fn deal_damage_to_player(&mut self, player_id: PlayerId, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let player = self.get_player_mut(player_id)?;
        player.lose_life(amount);
        let life = player.life;
        let name = player.name.clone();
        self.logger
            .normal(&format!("{name} takes {amount} damage ({life} life)"));
        Ok(())
    }

    /// Mark damage on a creature. `deathtouch` records whether the source
    /// had deathtouch; destruction happens in the state-based scan.
    pub fn deal_damage_to_creature(
        &mut self,
        permanent_id: PermanentId,
        amount: i32,
        deathtouch: bool,
    ) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let permanent = self.permanents.get_mut(permanent_id)?;
        permanent.damage += amount;
        if deathtouch {
            permanent.deathtouched = true;
        }
        Ok(())
    }

    pub fn is_game_over(&self) -> bool {
        self.players.iter().filter(|p| !p.has_lost).count() <= 1
    }

    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_game_over() {
            return None;
        }
        self.players.iter().find(|p| !p.has_lost).map(|p| p.id)
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.has_lost).map(|p| p.id)
    }
}
