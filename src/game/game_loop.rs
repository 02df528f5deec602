//! Turn driver: runs games to completion
//!
//! Walks the step sequence, hands priority windows to the player
//! controllers, applies their actions through the casting and combat
//! engines, and stops on a win, a decking, or the turn budget.

use crate::core::{CardId, Keyword, PermanentId, PlayerId, Target, TargetSpec};
use crate::game::combat::can_block;
use crate::game::controller::{GameStateView, PlayerAction, PlayerController};
use crate::game::priority::PassOutcome;
use crate::game::{GameState, Step};
use crate::Result;
use smallvec::SmallVec;

/// Iteration cap for one priority window; exceeding it means a
/// controller is stuck in a loop and the step is forcibly ended
const MAX_PRIORITY_ITERATIONS: u32 = 10_000;

/// Result of running a game to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// None when the game hit the turn budget without a decision
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub turns_played: u32,
    pub end_reason: GameEndReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    /// A player's life total reached zero or less
    PlayerLost,
    /// A player drew from an empty library
    Decking,
    /// Turn budget exhausted with no winner
    TurnLimit,
}

/// Drives one game from the current state to an outcome
pub struct GameLoop<'a> {
    pub game: &'a mut GameState,
    max_turns: u32,
    decked: Option<PlayerId>,
}

impl<'a> GameLoop<'a> {
    pub fn new(game: &'a mut GameState) -> Self {
        GameLoop {
            game,
            max_turns: 100,
            decked: None,
        }
    }

    /// Turn budget; exceeding it yields a no-result outcome rather than
    /// looping unbounded
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run the game until someone wins or the turn budget runs out
    pub fn run_game(
        &mut self,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<GameResult> {
        loop {
            if self.game.turn.turn_number > self.max_turns {
                let turns = self.game.turn.turn_number - 1;
                self.game
                    .logger
                    .minimal(&format!("turn limit reached after {turns} turns"));
                return Ok(GameResult {
                    winner: None,
                    loser: None,
                    turns_played: turns,
                    end_reason: GameEndReason::TurnLimit,
                });
            }

            self.run_turn(controllers)?;

            if self.game.is_game_over() {
                let winner = self.game.winner();
                let loser = self.game.loser();
                let end_reason = if self.decked == loser && loser.is_some() {
                    GameEndReason::Decking
                } else {
                    GameEndReason::PlayerLost
                };
                let result = GameResult {
                    winner,
                    loser,
                    turns_played: self.game.turn.turn_number,
                    end_reason,
                };
                for controller in controllers.iter_mut() {
                    let id = controller.player_id();
                    let view = GameStateView::new(self.game, id);
                    controller.on_game_end(&view, winner == Some(id));
                }
                return Ok(result);
            }

            let active = self.game.turn.active_player;
            let next = self.game.opponent_of(active)?;
            self.game.turn.next_turn(next);
        }
    }

    /// Run the remaining steps of the current turn
    pub fn run_turn(&mut self, controllers: &mut [&mut dyn PlayerController]) -> Result<()> {
        let turn_number = self.game.turn.turn_number;
        let active_name = self
            .game
            .get_player(self.game.turn.active_player)?
            .name
            .clone();
        self.game
            .logger
            .normal(&format!("=== Turn {turn_number}: {active_name} ==="));

        loop {
            let step = self.game.turn.current_step;
            self.execute_step(step, controllers)?;
            if self.game.is_game_over() || !self.game.turn.advance_step() {
                return Ok(());
            }
        }
    }

    /// Run one step of the turn structure
    pub fn execute_step(
        &mut self,
        step: Step,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        self.game.logger.verbose(&format!("[{}]", step.label()));
        match step {
            Step::Untap => {
                self.game.get_player_mut(active)?.reset_lands_played();
                self.game.untap_step(active)?;
            }
            Step::Draw => {
                // Turn 1 belongs to the starting player, who skips their
                // first draw; whoever that is.
                let first_draw_skipped = self.game.turn.turn_number == 1;
                if !first_draw_skipped && self.game.draw_card(active)?.is_none() {
                    self.game.get_player_mut(active)?.has_lost = true;
                    self.decked = Some(active);
                    let name = self.game.get_player(active)?.name.clone();
                    self.game
                        .logger
                        .minimal(&format!("{name} draws from an empty library"));
                    return Ok(());
                }
                self.priority_round(controllers)?;
            }
            Step::DeclareAttackers => {
                self.declare_attackers_step(controllers)?;
                self.priority_round(controllers)?;
            }
            Step::DeclareBlockers => {
                self.declare_blockers_step(controllers)?;
                self.priority_round(controllers)?;
            }
            Step::CombatDamage => {
                self.game.resolve_combat_damage()?;
                if !self.game.is_game_over() {
                    self.priority_round(controllers)?;
                }
            }
            Step::EndCombat => {
                self.game.end_of_combat_cleanup();
            }
            Step::Cleanup => {
                self.game.cleanup_step();
            }
            Step::Upkeep | Step::Main1 | Step::BeginCombat | Step::Main2 | Step::End => {
                self.priority_round(controllers)?;
            }
        }
        Ok(())
    }

    /// One priority window: players act and pass until both pass in
    /// succession on an empty stack
    fn priority_round(&mut self, controllers: &mut [&mut dyn PlayerController]) -> Result<()> {
        let active = self.game.turn.active_player;
        let nonactive = self.game.opponent_of(active)?;
        self.game.priority.begin_step(active, nonactive);

        let mut iterations = 0u32;
        loop {
            iterations += 1;
            if iterations > MAX_PRIORITY_ITERATIONS {
                self.game
                    .logger
                    .minimal("priority window did not converge; forcing step end");
                return Ok(());
            }
            if self.game.is_game_over() {
                return Ok(());
            }

            let holder = self.game.priority.holder();
            let actions = self.available_actions(holder)?;
            let chosen = {
                let view = GameStateView::new(self.game, holder);
                controller_for(controllers, holder)
                    .and_then(|c| c.choose_action(&view, &actions))
            };

            match chosen {
                Some(PlayerAction::PassPriority) | None => {
                    let stack_empty = self.game.stack.is_empty();
                    match self.game.priority.pass_priority(holder, stack_empty)? {
                        PassOutcome::Waiting => {}
                        PassOutcome::ResolveTop => self.game.resolve_top()?,
                        PassOutcome::StepEnds => return Ok(()),
                    }
                }
                Some(action) => {
                    // Actions were enumerated as legal, but the state may
                    // have shifted; a rejected action becomes a pass.
                    if let Err(e) = self.apply_action(holder, &action) {
                        self.game.logger.verbose(&format!("action rejected: {e}"));
                        match self
                            .game
                            .priority
                            .pass_priority(holder, self.game.stack.is_empty())?
                        {
                            PassOutcome::Waiting => {}
                            PassOutcome::ResolveTop => self.game.resolve_top()?,
                            PassOutcome::StepEnds => return Ok(()),
                        }
                    }
                }
            }
        }
    }

    fn apply_action(&mut self, player: PlayerId, action: &PlayerAction) -> Result<()> {
        match action {
            PlayerAction::PlayLand(card_id) => {
                self.game.play_land(player, *card_id)?;
                self.game.priority.note_action(player);
            }
            PlayerAction::CastSpell { card_id, targets } => {
                self.game.cast_spell(player, *card_id, targets)?;
            }
            PlayerAction::TapForMana(permanent_id) => {
                self.game.tap_for_mana(player, *permanent_id)?;
                self.game.priority.note_action(player);
            }
            PlayerAction::ActivateAbility {
                permanent,
                ability_index,
                targets,
            } => {
                self.game
                    .activate_ability(player, *permanent, *ability_index, targets)?;
            }
            PlayerAction::PassPriority => {}
        }
        Ok(())
    }

    /// Enumerate legal actions for the priority holder
    fn available_actions(&self, player: PlayerId) -> Result<Vec<PlayerAction>> {
        let mut actions = Vec::new();
        let sorcery_window = player == self.game.turn.active_player
            && self.game.stack.is_empty()
            && self.game.turn.current_step.is_sorcery_speed();

        let hand = self.get_hand(player)?;
        let pool = &self.game.get_player(player)?.mana_pool;

        for &card_id in &hand {
            let card = self.game.cards.get(card_id)?;
            if card.data.is_land() {
                if sorcery_window && self.game.get_player(player)?.can_play_land() {
                    actions.push(PlayerAction::PlayLand(card_id));
                }
                continue;
            }
            let instant_speed =
                card.data.is_instant() || card.data.has_keyword(Keyword::Flash);
            if !instant_speed && !sorcery_window {
                continue;
            }
            if !pool.can_pay(&card.data.mana_cost) {
                continue;
            }
            let specs: Vec<TargetSpec> = card
                .data
                .spell_effects
                .iter()
                .map(|e| e.target_spec())
                .filter(|s| *s != TargetSpec::None)
                .collect();
            if let Some(targets) = self.default_targets(player, &specs) {
                actions.push(PlayerAction::CastSpell { card_id, targets });
            }
        }

        // Abilities of controlled permanents
        let permanent_ids: Vec<PermanentId> =
            self.game.get_player(player)?.all_permanents().collect();
        for id in permanent_ids {
            let permanent = self.game.permanents.get(id)?;
            if permanent.is_mana_producer() && !permanent.tapped {
                actions.push(PlayerAction::TapForMana(id));
            }
            for (index, ability) in permanent.card.abilities.iter().enumerate() {
                if ability.kind != crate::core::AbilityKind::Activated {
                    continue;
                }
                if ability.timing == crate::core::Timing::SorcerySpeed && !sorcery_window {
                    continue;
                }
                if ability.cost.tap
                    && (permanent.tapped
                        || (permanent.is_creature()
                            && permanent.summoning_sick
                            && !permanent.has_keyword(Keyword::Haste)))
                {
                    continue;
                }
                if !pool.can_pay(&ability.cost.mana) {
                    continue;
                }
                let specs: Vec<TargetSpec> = ability.required_targets().to_vec();
                if let Some(targets) = self.default_targets(player, &specs) {
                    actions.push(PlayerAction::ActivateAbility {
                        permanent: id,
                        ability_index: index,
                        targets,
                    });
                }
            }
        }

        Ok(actions)
    }

    fn get_hand(&self, player: PlayerId) -> Result<Vec<CardId>> {
        Ok(self.game.get_player_zones(player)?.hand.cards.clone())
    }

    /// Fill target slots with a simple default policy: damage and player
    /// targets go at the opponent, creature targets at the opponent's
    /// first creature, spell targets at the top of the stack. None if a
    /// slot cannot be filled.
    fn default_targets(
        &self,
        player: PlayerId,
        specs: &[TargetSpec],
    ) -> Option<SmallVec<[Target; 2]>> {
        let opponent = self.game.opponent_of(player).ok()?;
        let mut targets = SmallVec::new();
        for spec in specs {
            let target = match spec {
                TargetSpec::None => continue,
                TargetSpec::AnyTarget | TargetSpec::TargetPlayer => Target::Player(opponent),
                TargetSpec::TargetCreature => {
                    let creature = self
                        .game
                        .get_player(opponent)
                        .ok()?
                        .creatures
                        .first()
                        .copied()?;
                    Target::Permanent(creature)
                }
                TargetSpec::TargetSpell => Target::Spell(self.game.stack.peek()?.id),
            };
            targets.push(target);
        }
        Some(targets)
    }

    fn declare_attackers_step(
        &mut self,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        let legal: Vec<PermanentId> = self
            .game
            .get_player(active)?
            .creatures
            .iter()
            .copied()
            .filter(|&id| {
                self.game
                    .permanents
                    .get(id)
                    .map(|p| {
                        !p.tapped
                            && (!p.summoning_sick || p.has_keyword(Keyword::Haste))
                            && !p.has_keyword(Keyword::Defender)
                    })
                    .unwrap_or(false)
            })
            .collect();
        if legal.is_empty() {
            return Ok(());
        }

        let chosen = {
            let view = GameStateView::new(self.game, active);
            match controller_for(controllers, active) {
                Some(c) => c.choose_attackers(&view, &legal),
                None => Vec::new(),
            }
        };
        let chosen: Vec<PermanentId> =
            chosen.into_iter().filter(|id| legal.contains(id)).collect();
        if !chosen.is_empty() {
            self.game.declare_attackers(active, &chosen)?;
        }
        Ok(())
    }

    fn declare_blockers_step(
        &mut self,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        let defender = self.game.opponent_of(active)?;

        let attackers: Vec<PermanentId> = self
            .game
            .get_player(active)?
            .creatures
            .iter()
            .copied()
            .filter(|&id| {
                self.game
                    .permanents
                    .get(id)
                    .map(|p| p.is_attacking())
                    .unwrap_or(false)
            })
            .collect();
        if attackers.is_empty() {
            return Ok(());
        }

        let mut legal_blocks = Vec::new();
        for &blocker_id in &self.game.get_player(defender)?.creatures {
            let blocker = self.game.permanents.get(blocker_id)?;
            if blocker.tapped {
                continue;
            }
            for &attacker_id in &attackers {
                let attacker = self.game.permanents.get(attacker_id)?;
                if can_block(attacker, blocker) {
                    legal_blocks.push((blocker_id, attacker_id));
                }
            }
        }
        if legal_blocks.is_empty() {
            return Ok(());
        }

        let chosen = {
            let view = GameStateView::new(self.game, defender);
            match controller_for(controllers, defender) {
                Some(c) => c.choose_blockers(&view, &legal_blocks),
                None => Vec::new(),
            }
        };
        let chosen: Vec<(PermanentId, PermanentId)> = chosen
            .into_iter()
            .filter(|pair| legal_blocks.contains(pair))
            .collect();
        if chosen.is_empty() {
            return Ok(());
        }

        // An assignment the resolver rejects (e.g. a lone blocker on a
        // menace attacker) is dropped, leaving the attack unblocked.
        if let Err(e) = self.game.declare_blockers(defender, &chosen) {
            self.game
                .logger
                .verbose(&format!("block assignment rejected: {e}"));
        }
        Ok(())
    }
}

fn controller_for<'c, 'd>(
    controllers: &'c mut [&'d mut dyn PlayerController],
    player: PlayerId,
) -> Option<&'c mut &'d mut dyn PlayerController> {
    controllers.iter_mut().find(|c| c.player_id() == player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ability, CardData, CardType, ManaColor, ManaCost};
    use crate::game::zero_controller::ZeroController;
    use crate::game::GameLogger;
    use smallvec::smallvec;

    fn forest() -> CardData {
        let mut data = CardData::new("Forest");
        data.types.push(CardType::Land);
        data.abilities
            .push(Ability::mana_ability(smallvec![ManaColor::Green]));
        data
    }

    fn bear() -> CardData {
        let mut data = CardData::new("Grizzly Bears");
        data.types.push(CardType::Creature);
        data.colors.push(ManaColor::Green);
        data.mana_cost = ManaCost::new()
            .with_generic(1)
            .with_colored(ManaColor::Green, 1);
        data.power = Some(2);
        data.toughness = Some(2);
        data
    }

    fn load_deck(game: &mut GameState, player: PlayerId, copies: usize) {
        for _ in 0..copies {
            game.add_card_to_library(player, forest()).unwrap();
            game.add_card_to_library(player, bear()).unwrap();
        }
    }

    #[test]
    fn test_zero_vs_zero_game_completes() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.logger = GameLogger::silent();
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        load_deck(&mut game, p1, 20);
        load_deck(&mut game, p2, 20);
        for _ in 0..7 {
            game.draw_card(p1).unwrap();
            game.draw_card(p2).unwrap();
        }

        let mut c1 = ZeroController::new(p1);
        let mut c2 = ZeroController::new(p2);
        let mut controllers: Vec<&mut dyn PlayerController> = vec![&mut c1, &mut c2];

        let result = GameLoop::new(&mut game)
            .with_max_turns(60)
            .run_game(&mut controllers)
            .unwrap();
        assert!(result.turns_played >= 1);
        // Either someone won or the budget ran out; both are well-defined
        if result.end_reason == GameEndReason::TurnLimit {
            assert_eq!(result.winner, None);
        } else {
            assert!(result.winner.is_some());
            assert!(result.loser.is_some());
        }
    }

    #[test]
    fn test_turn_limit_yields_no_result() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.logger = GameLogger::silent();
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        // Lands only: nobody can ever win by damage
        for _ in 0..60 {
            game.add_card_to_library(p1, forest()).unwrap();
            game.add_card_to_library(p2, forest()).unwrap();
        }

        let mut c1 = ZeroController::new(p1);
        let mut c2 = ZeroController::new(p2);
        let mut controllers: Vec<&mut dyn PlayerController> = vec![&mut c1, &mut c2];

        let result = GameLoop::new(&mut game)
            .with_max_turns(5)
            .run_game(&mut controllers)
            .unwrap();
        assert_eq!(result.end_reason, GameEndReason::TurnLimit);
        assert_eq!(result.winner, None);
        assert_eq!(result.turns_played, 5);
    }

    #[test]
    fn test_first_draw_skip_follows_starting_player() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.logger = GameLogger::silent();
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        load_deck(&mut game, p2, 20);
        for _ in 0..7 {
            game.draw_card(p2).unwrap();
        }
        // Bob takes the first turn instead of Alice
        game.turn.active_player = p2;

        let mut c1 = ZeroController::new(p1);
        let mut c2 = ZeroController::new(p2);
        let mut controllers: Vec<&mut dyn PlayerController> = vec![&mut c1, &mut c2];

        let before = game.get_player_zones(p2).unwrap().hand.len();
        GameLoop::new(&mut game)
            .execute_step(Step::Draw, &mut controllers)
            .unwrap();
        // The starting player skips the turn-1 draw whoever they are
        assert_eq!(game.get_player_zones(p2).unwrap().hand.len(), before);
    }

    #[test]
    fn test_decking_loses() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.logger = GameLogger::silent();
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        // One card each; p2 decks first (p1 skips the first draw)
        game.add_card_to_library(p1, forest()).unwrap();
        game.add_card_to_library(p2, forest()).unwrap();
        game.draw_card(p1).unwrap();
        game.draw_card(p2).unwrap();

        let mut c1 = ZeroController::new(p1);
        let mut c2 = ZeroController::new(p2);
        let mut controllers: Vec<&mut dyn PlayerController> = vec![&mut c1, &mut c2];

        let result = GameLoop::new(&mut game)
            .with_max_turns(10)
            .run_game(&mut controllers)
            .unwrap();
        assert_eq!(result.end_reason, GameEndReason::Decking);
        assert_eq!(result.winner, Some(p1));
        assert_eq!(result.loser, Some(p2));
    }
}
