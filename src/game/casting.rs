//! Casting spells, activating abilities, and resolving the stack
//!
//! Casting validates timing, targets and mana up front and pushes a
//! [`StackItem`](crate::game::stack::StackItem); nothing takes effect
//! until the item resolves. Counterspells follow the same path: the
//! countered flag on their target is set when the counterspell RESOLVES,
//! so a counterspell can itself be countered.

use crate::core::{CardId, Effect, Keyword, PermanentId, PlayerId, StackId, Target, TargetSpec};
use crate::game::stack::{StackItem, StackPayload};
use crate::game::GameState;
use crate::{Result, SimError};
use smallvec::SmallVec;

impl GameState {
    /// Cast a spell from the caster's hand, paying its mana cost and
    /// pushing it onto the stack.
    ///
    /// Targets are validated here but only bind at resolution; a target
    /// that becomes illegal in between makes the spell fizzle.
    pub fn cast_spell(
        &mut self,
        caster: PlayerId,
        card_id: CardId,
        targets: &[Target],
    ) -> Result<StackId> {
        let (name, cost, specs, instant_speed) = {
            let card = self.cards.get(card_id)?;
            if card.data.is_land() {
                return Err(SimError::InvalidAction(format!(
                    "{} is a land; lands are played, not cast",
                    card.data.name
                )));
            }
            let instant_speed = card.data.is_instant() || card.data.has_keyword(Keyword::Flash);
            (
                card.data.name.clone(),
                card.data.mana_cost.clone(),
                spell_target_specs(&card.data),
                instant_speed,
            )
        };

        if !self.get_player_zones(caster)?.hand.contains(card_id) {
            return Err(SimError::InvalidAction(format!("{name} is not in hand")));
        }
        self.check_timing(caster, instant_speed)?;
        self.check_targets(&specs, targets)?;

        let pool = &mut self.get_player_mut(caster)?.mana_pool;
        if !pool.can_pay(&cost) {
            return Err(SimError::InsufficientMana {
                cost: cost.to_string(),
                pool: pool.to_string(),
            });
        }
        pool.pay(&cost)?;

        self.get_player_zones_mut(caster)?.hand.remove(card_id);
        let stack_id = self.next_stack_id();
        self.stack.push(StackItem {
            id: stack_id,
            caster,
            payload: StackPayload::Spell { card_id },
            targets: targets.iter().copied().collect(),
            countered: false,
        });
        self.priority.note_action(caster);

        let caster_name = self.get_player(caster)?.name.clone();
        self.logger.normal(&format!("{caster_name} casts {name}"));
        Ok(stack_id)
    }

    /// Cast a countering spell targeting a pending stack item.
    ///
    /// Convenience wrapper over [`GameState::cast_spell`]; the target is
    /// only marked countered when this spell resolves.
    pub fn counter_spell(
        &mut self,
        caster: PlayerId,
        card_id: CardId,
        target: StackId,
    ) -> Result<StackId> {
        self.cast_spell(caster, card_id, &[Target::Spell(target)])
    }

    /// Activate an ability of a permanent.
    ///
    /// Mana abilities take effect immediately and bypass the stack
    /// (returning `None`); activated abilities are pushed like spells and
    /// return their stack ID.
    pub fn activate_ability(
        &mut self,
        player: PlayerId,
        permanent_id: PermanentId,
        ability_index: usize,
        targets: &[Target],
    ) -> Result<Option<StackId>> {
        let ability = {
            let permanent = self.permanents.get(permanent_id)?;
            if permanent.owner != player {
                return Err(SimError::InvalidAction(
                    "cannot activate an opponent's ability".to_string(),
                ));
            }
            permanent
                .card
                .abilities
                .get(ability_index)
                .ok_or_else(|| {
                    SimError::InvalidAction(format!(
                        "{} has no ability #{ability_index}",
                        permanent.card.name
                    ))
                })?
                .clone()
        };

        if ability.is_mana_ability() {
            // No stack, no timing restriction, no summoning sickness.
            self.tap_for_mana(player, permanent_id)?;
            return Ok(None);
        }
        if ability.kind != crate::core::AbilityKind::Activated {
            return Err(SimError::InvalidAction(
                "only activated and mana abilities can be activated".to_string(),
            ));
        }

        self.check_timing(player, ability.timing != crate::core::Timing::SorcerySpeed)?;
        self.check_targets(&ability.required_targets(), targets)?;

        // All cost checks happen before any payment: a rejected
        // activation must leave the pool and the source untouched.
        {
            let permanent = self.permanents.get(permanent_id)?;
            if ability.cost.tap {
                if permanent.tapped {
                    return Err(SimError::InvalidAction(format!(
                        "{} is already tapped",
                        permanent.card.name
                    )));
                }
                if permanent.is_creature()
                    && permanent.summoning_sick
                    && !permanent.has_keyword(Keyword::Haste)
                {
                    return Err(SimError::IllegalTiming(format!(
                        "{} is summoning sick",
                        permanent.card.name
                    )));
                }
            }
        }

        let pool = &mut self.get_player_mut(player)?.mana_pool;
        if !pool.can_pay(&ability.cost.mana) {
            return Err(SimError::InsufficientMana {
                cost: ability.cost.mana.to_string(),
                pool: pool.to_string(),
            });
        }
        pool.pay(&ability.cost.mana)?;
        if ability.cost.tap {
            self.permanents.get_mut(permanent_id)?.tap()?;
        }

        let name = self.permanents.get(permanent_id)?.card.name.clone();
        let stack_id = self.next_stack_id();
        self.stack.push(StackItem {
            id: stack_id,
            caster: player,
            payload: StackPayload::Ability {
                source: permanent_id,
                ability,
            },
            targets: targets.iter().copied().collect(),
            countered: false,
        });
        self.priority.note_action(player);
        self.logger
            .normal(&format!("{name}'s ability goes on the stack"));
        Ok(Some(stack_id))
    }

    /// Resolve the top item of the stack, then run state-based actions.
    ///
    /// Countered items and items whose targets or source are gone are
    /// discarded without effect (spell cards still hit the graveyard).
    pub fn resolve_top(&mut self) -> Result<()> {
        let item = self.stack.pop();

        if item.countered {
            self.discard_resolved(&item, "countered")?;
            self.priority.reset_after_resolution();
            self.check_state_based_actions()?;
            return Ok(());
        }

        match &item.payload {
            StackPayload::Spell { card_id } => {
                let card_id = *card_id;
                let data = self.cards.get(card_id)?.data.clone();
                let specs = spell_target_specs(&data);
                if !self.targets_still_legal(&specs, &item.targets) {
                    self.discard_resolved(&item, "fizzles")?;
                } else if data.is_permanent_type() {
                    self.enter_battlefield(card_id, item.caster)?;
                    self.logger
                        .normal(&format!("{} enters the battlefield", data.name));
                } else {
                    let deathtouch = data.has_keyword(Keyword::Deathtouch);
                    self.execute_effects(
                        item.caster,
                        &data.spell_effects,
                        &item.targets,
                        deathtouch,
                    )?;
                    let owner = self.cards.get(card_id)?.owner;
                    self.get_player_zones_mut(owner)?.graveyard.add(card_id);
                    self.logger.normal(&format!("{} resolves", data.name));
                }
            }
            StackPayload::Ability { source, ability } => {
                // The ability fizzles if its source left the battlefield
                // or any target became illegal.
                if !self.permanents.contains(*source)
                    || !self.targets_still_legal(&ability.required_targets(), &item.targets)
                {
                    self.logger.verbose("ability fizzles");
                } else {
                    let deathtouch = self
                        .permanents
                        .get(*source)?
                        .has_keyword(Keyword::Deathtouch);
                    self.execute_effects(item.caster, &ability.effects, &item.targets, deathtouch)?;
                }
            }
        }

        self.priority.reset_after_resolution();
        self.check_state_based_actions()?;
        Ok(())
    }

    /// Resolve every pending item, top first
    pub fn resolve_stack(&mut self) -> Result<()> {
        while !self.stack.is_empty() {
            self.resolve_top()?;
        }
        Ok(())
    }

    /// Put a resolved-without-effect spell's card in its owner's graveyard
    fn discard_resolved(&mut self, item: &StackItem, why: &str) -> Result<()> {
        if let StackPayload::Spell { card_id } = item.payload {
            let (owner, name) = {
                let card = self.cards.get(card_id)?;
                (card.owner, card.data.name.clone())
            };
            self.get_player_zones_mut(owner)?.graveyard.add(card_id);
            self.logger.normal(&format!("{name} {why}"));
        } else {
            self.logger.verbose(&format!("ability {why}"));
        }
        Ok(())
    }

    /// Timing legality for the given player right now.
    ///
    /// Instant-speed actions only require priority. Sorcery-speed actions
    /// additionally require the player's own main phase and an empty
    /// stack.
    fn check_timing(&self, player: PlayerId, instant_speed: bool) -> Result<()> {
        if self.priority.holder() != player {
            return Err(SimError::IllegalTiming(
                "player does not hold priority".to_string(),
            ));
        }
        if instant_speed {
            return Ok(());
        }
        if self.turn.active_player != player {
            return Err(SimError::IllegalTiming(
                "sorcery-speed action outside own turn".to_string(),
            ));
        }
        if !self.turn.current_step.is_sorcery_speed() {
            return Err(SimError::IllegalTiming(format!(
                "sorcery-speed action during {:?}",
                self.turn.current_step
            )));
        }
        if !self.stack.is_empty() {
            return Err(SimError::IllegalTiming(
                "sorcery-speed action with a non-empty stack".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate chosen targets against the required specs, in order
    fn check_targets(&self, specs: &[TargetSpec], targets: &[Target]) -> Result<()> {
        if specs.len() != targets.len() {
            return Err(SimError::TargetInvalid(format!(
                "expected {} target(s), got {}",
                specs.len(),
                targets.len()
            )));
        }
        for (spec, target) in specs.iter().zip(targets) {
            if !self.target_matches(*spec, *target) {
                return Err(SimError::TargetInvalid(format!(
                    "{target:?} is not a legal {spec:?}"
                )));
            }
        }
        Ok(())
    }

    /// Resolution-time re-check: every chosen target must still be legal
    fn targets_still_legal(&self, specs: &[TargetSpec], targets: &[Target]) -> bool {
        specs.len() == targets.len()
            && specs
                .iter()
                .zip(targets)
                .all(|(spec, target)| self.target_matches(*spec, *target))
    }

    fn target_matches(&self, spec: TargetSpec, target: Target) -> bool {
        match (spec, target) {
            (TargetSpec::AnyTarget, Target::Player(p)) => self.get_player(p).is_ok(),
            (TargetSpec::AnyTarget, Target::Permanent(p)) => {
                self.permanents.get(p).map(|x| x.is_creature()).unwrap_or(false)
            }
            (TargetSpec::TargetCreature, Target::Permanent(p)) => {
                self.permanents.get(p).map(|x| x.is_creature()).unwrap_or(false)
            }
            (TargetSpec::TargetPlayer, Target::Player(p)) => self.get_player(p).is_ok(),
            (TargetSpec::TargetSpell, Target::Spell(s)) => self.stack.contains(s),
            _ => false,
        }
    }

    /// Apply an effect list in order, consuming chosen targets as each
    /// targeted effect comes up
    fn execute_effects(
        &mut self,
        caster: PlayerId,
        effects: &[Effect],
        targets: &[Target],
        source_deathtouch: bool,
    ) -> Result<()> {
        let mut next_target = 0usize;
        for effect in effects {
            let target = if effect.target_spec() != TargetSpec::None {
                let t = targets.get(next_target).copied().ok_or_else(|| {
                    SimError::TargetInvalid("missing target for effect".to_string())
                })?;
                next_target += 1;
                Some(t)
            } else {
                None
            };

            match effect {
                Effect::DealDamage { amount, .. } => match target {
                    Some(Target::Player(p)) => self.deal_damage_to_player(p, *amount)?,
                    Some(Target::Permanent(p)) => {
                        self.deal_damage_to_creature(p, *amount, source_deathtouch)?
                    }
                    _ => {
                        return Err(SimError::TargetInvalid(
                            "damage effect needs a creature or player target".to_string(),
                        ))
                    }
                },
                Effect::AddMana { colors } => {
                    if let Some(&color) = colors.first() {
                        self.add_mana(caster, color, 1)?;
                    }
                }
                Effect::ModifyStats {
                    power,
                    toughness,
                    duration,
                    ..
                } => {
                    if let Some(Target::Permanent(p)) = target {
                        let permanent = self.permanents.get_mut(p)?;
                        match duration {
                            crate::core::Duration::EndOfTurn => {
                                permanent.power_bonus += power;
                                permanent.toughness_bonus += toughness;
                            }
                            crate::core::Duration::Permanent => {
                                permanent.power += power;
                                permanent.toughness += toughness;
                            }
                        }
                    }
                }
                Effect::GainLife { amount } => {
                    self.get_player_mut(caster)?.gain_life(*amount);
                }
                Effect::DrawCards { count } => {
                    for _ in 0..*count {
                        if self.draw_card(caster)?.is_none() {
                            // Drawing from an empty library loses the game
                            self.get_player_mut(caster)?.has_lost = true;
                            break;
                        }
                    }
                }
                Effect::Destroy { .. } => {
                    if let Some(Target::Permanent(p)) = target {
                        self.destroy_permanent(p)?;
                    }
                }
                Effect::CounterSpell => {
                    if let Some(Target::Spell(s)) = target {
                        // False means the target already left the stack;
                        // the counter does nothing.
                        self.stack.mark_countered(s);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Target specs a spell's effects require, in effect order
fn spell_target_specs(data: &crate::core::CardData) -> SmallVec<[TargetSpec; 2]> {
    data.spell_effects
        .iter()
        .map(|e| e.target_spec())
        .filter(|spec| *spec != TargetSpec::None)
        .collect()
}
