//! Combat: attack/block declaration and staged damage resolution
//!
//! Block legality is a pairwise predicate over the attacker's evasion
//! keywords. Damage happens in a small state machine
//! (first strike, cleanup, regular, cleanup) and each damage step
//! computes every creature's damage before applying any of it, so
//! simultaneous deaths cannot depend on iteration order.

use crate::core::{Keyword, ManaColor, Permanent, PermanentId, PlayerId};
use crate::game::GameState;
use crate::{Result, SimError};
use rustc_hash::FxHashMap;

/// Damage-resolution state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStep {
    FirstStrikeDamage,
    Cleanup1,
    RegularDamage,
    Cleanup2,
    Done,
}

/// Can `blocker` legally block `attacker`?
///
/// Evasion keywords are checked in order: flying, intimidate, shadow,
/// fear, then protection (which overrides any permissive result above).
/// Menace needs the full block assignment and is enforced in
/// [`GameState::declare_blockers`], not here.
pub fn can_block(attacker: &Permanent, blocker: &Permanent) -> bool {
    if !blocker.is_creature() || blocker.tapped {
        return false;
    }
    if attacker.has_keyword(Keyword::Flying)
        && !blocker.has_keyword(Keyword::Flying)
        && !blocker.has_keyword(Keyword::Reach)
    {
        return false;
    }
    if attacker.has_keyword(Keyword::Intimidate)
        && !blocker.card.is_artifact()
        && !attacker.card.shares_color_with(&blocker.card)
    {
        return false;
    }
    // Shadow creatures block only shadow, and only shadow blocks them
    if attacker.has_keyword(Keyword::Shadow) != blocker.has_keyword(Keyword::Shadow) {
        return false;
    }
    if attacker.has_keyword(Keyword::Fear)
        && !blocker.card.is_artifact()
        && !blocker.card.colors.contains(&ManaColor::Black)
    {
        return false;
    }
    if attacker.protection_against(blocker).is_some() {
        return false;
    }
    true
}

enum Recipient {
    Player(PlayerId),
    Creature(PermanentId),
}

/// One staged packet of combat damage, computed before application
struct PendingDamage {
    recipient: Recipient,
    amount: i32,
    deathtouch: bool,
    /// Controller to credit with lifelink, if the source has it
    lifelink: Option<PlayerId>,
}

impl GameState {
    /// Declare attackers for the active player; attackers tap unless they
    /// have vigilance.
    pub fn declare_attackers(
        &mut self,
        player: PlayerId,
        attackers: &[PermanentId],
    ) -> Result<()> {
        let defender = self.opponent_of(player)?;

        for &id in attackers {
            let p = self.permanents.get(id)?;
            if p.owner != player {
                return Err(SimError::InvalidAction(format!(
                    "{} is not controlled by the attacking player",
                    p.card.name
                )));
            }
            if !p.is_creature() {
                return Err(SimError::InvalidAction(format!(
                    "{} is not a creature",
                    p.card.name
                )));
            }
            if p.tapped {
                return Err(SimError::InvalidAction(format!(
                    "{} is tapped and cannot attack",
                    p.card.name
                )));
            }
            if p.summoning_sick && !p.has_keyword(Keyword::Haste) {
                return Err(SimError::IllegalTiming(format!(
                    "{} is summoning sick",
                    p.card.name
                )));
            }
            if p.has_keyword(Keyword::Defender) {
                return Err(SimError::InvalidAction(format!(
                    "{} has defender",
                    p.card.name
                )));
            }
        }

        for &id in attackers {
            let vigilance = self.permanents.get(id)?.has_keyword(Keyword::Vigilance);
            let p = self.permanents.get_mut(id)?;
            p.attacking = Some(defender);
            if !vigilance {
                p.tap()?;
            }
            let name = p.card.name.clone();
            self.logger.normal(&format!("{name} attacks"));
        }
        Ok(())
    }

    /// Declare blockers: `blocks` pairs each blocker with the attacker it
    /// blocks. The whole assignment is validated (including Menace's
    /// two-blocker minimum) before any of it is applied.
    pub fn declare_blockers(
        &mut self,
        player: PlayerId,
        blocks: &[(PermanentId, PermanentId)],
    ) -> Result<()> {
        let mut per_attacker: FxHashMap<u32, u32> = FxHashMap::default();

        for &(blocker_id, attacker_id) in blocks {
            let blocker = self.permanents.get(blocker_id)?;
            let attacker = self.permanents.get(attacker_id)?;
            if blocker.owner != player {
                return Err(SimError::InvalidAction(format!(
                    "{} is not controlled by the blocking player",
                    blocker.card.name
                )));
            }
            if attacker.attacking != Some(player) {
                return Err(SimError::InvalidAction(format!(
                    "{} is not attacking this player",
                    attacker.card.name
                )));
            }
            if !can_block(attacker, blocker) {
                return Err(SimError::TargetInvalid(format!(
                    "{} cannot block {}",
                    blocker.card.name, attacker.card.name
                )));
            }
            *per_attacker.entry(attacker_id.as_u32()).or_insert(0) += 1;
        }

        for (&attacker_raw, &count) in &per_attacker {
            let attacker = self.permanents.get(PermanentId::new(attacker_raw))?;
            if attacker.has_keyword(Keyword::Menace) && count < 2 {
                return Err(SimError::InvalidAction(format!(
                    "{} has menace and needs at least two blockers",
                    attacker.card.name
                )));
            }
        }

        for &(blocker_id, attacker_id) in blocks {
            self.permanents.get_mut(blocker_id)?.blocking = Some(attacker_id);
            self.permanents
                .get_mut(attacker_id)?
                .blocked_by
                .push(blocker_id);
            let blocker_name = self.permanents.get(blocker_id)?.card.name.clone();
            let attacker_name = self.permanents.get(attacker_id)?.card.name.clone();
            self.logger
                .normal(&format!("{blocker_name} blocks {attacker_name}"));
        }
        Ok(())
    }

    /// Run the full damage state machine:
    /// FirstStrikeDamage -> Cleanup1 -> RegularDamage -> Cleanup2 -> Done.
    ///
    /// Combat assignments are NOT cleared here; the phase driver does that
    /// at end of combat.
    pub fn resolve_combat_damage(&mut self) -> Result<()> {
        let mut step = CombatStep::FirstStrikeDamage;
        while step != CombatStep::Done {
            step = self.advance_combat_step(step)?;
        }
        Ok(())
    }

    fn advance_combat_step(&mut self, step: CombatStep) -> Result<CombatStep> {
        match step {
            CombatStep::FirstStrikeDamage => {
                let events = self.compute_combat_damage(true)?;
                self.apply_combat_damage(events)?;
                Ok(CombatStep::Cleanup1)
            }
            CombatStep::Cleanup1 => {
                self.check_state_based_actions()?;
                Ok(CombatStep::RegularDamage)
            }
            CombatStep::RegularDamage => {
                let events = self.compute_combat_damage(false)?;
                self.apply_combat_damage(events)?;
                Ok(CombatStep::Cleanup2)
            }
            CombatStep::Cleanup2 => {
                self.check_state_based_actions()?;
                Ok(CombatStep::Done)
            }
            CombatStep::Done => Ok(CombatStep::Done),
        }
    }

    /// Combatants in deterministic order: players in seat order, each
    /// player's creature list in declaration order
    fn combat_participants(&self) -> Vec<PermanentId> {
        self.players
            .iter()
            .flat_map(|p| p.creatures.iter().copied())
            .collect()
    }

    /// Compute every qualifying creature's damage without applying any
    /// of it. `first_strike` selects the first-strike step (first/double
    /// strikers) versus the regular step (everyone else, plus double
    /// strikers again).
    fn compute_combat_damage(&self, first_strike: bool) -> Result<Vec<PendingDamage>> {
        let mut events = Vec::new();

        for id in self.combat_participants() {
            let creature = self.permanents.get(id)?;
            let fs = creature.has_keyword(Keyword::FirstStrike);
            let ds = creature.has_keyword(Keyword::DoubleStrike);
            let deals = if first_strike { fs || ds } else { !fs || ds };
            if !deals {
                continue;
            }
            let power = creature.current_power();
            if power <= 0 {
                continue;
            }
            let deathtouch = creature.has_keyword(Keyword::Deathtouch);
            let lifelink = creature.has_keyword(Keyword::Lifelink).then_some(creature.owner);

            if let Some(defender) = creature.attacking {
                if creature.blocked_by.is_empty() {
                    events.push(PendingDamage {
                        recipient: Recipient::Player(defender),
                        amount: power,
                        deathtouch,
                        lifelink,
                    });
                } else {
                    let trample = creature.has_keyword(Keyword::Trample);
                    let mut remaining = power;
                    let last = creature.blocked_by.len() - 1;
                    for (i, &blocker_id) in creature.blocked_by.iter().enumerate() {
                        let blocker = self.permanents.get(blocker_id)?;
                        let lethal_needed = if deathtouch {
                            1
                        } else {
                            (blocker.current_toughness() - blocker.damage).max(0)
                        };
                        // Without trample the last blocker soaks up the rest
                        let assigned = if trample || i < last {
                            remaining.min(lethal_needed)
                        } else {
                            remaining
                        };
                        if assigned > 0 {
                            events.push(PendingDamage {
                                recipient: Recipient::Creature(blocker_id),
                                amount: assigned,
                                deathtouch,
                                lifelink,
                            });
                            remaining -= assigned;
                        }
                    }
                    if trample && remaining > 0 {
                        events.push(PendingDamage {
                            recipient: Recipient::Player(defender),
                            amount: remaining,
                            deathtouch,
                            lifelink,
                        });
                    }
                }
            } else if let Some(attacker_id) = creature.blocking {
                if self.permanents.contains(attacker_id) {
                    events.push(PendingDamage {
                        recipient: Recipient::Creature(attacker_id),
                        amount: power,
                        deathtouch,
                        lifelink,
                    });
                }
            }
        }
        Ok(events)
    }

    fn apply_combat_damage(&mut self, events: Vec<PendingDamage>) -> Result<()> {
        for event in events {
            match event.recipient {
                Recipient::Player(player_id) => {
                    self.deal_damage_to_player(player_id, event.amount)?;
                }
                Recipient::Creature(permanent_id) => {
                    self.deal_damage_to_creature(permanent_id, event.amount, event.deathtouch)?;
                }
            }
            if let Some(controller) = event.lifelink {
                self.get_player_mut(controller)?.gain_life(event.amount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardData, CardType, EntityId};

    fn creature_data(name: &str, power: i32, toughness: i32) -> CardData {
        let mut data = CardData::new(name);
        data.types.push(CardType::Creature);
        data.power = Some(power);
        data.toughness = Some(toughness);
        data
    }

    fn make_permanent(data: CardData) -> Permanent {
        Permanent::from_card(EntityId::new(1), EntityId::new(2), EntityId::new(0), data)
    }

    fn summon(
        game: &mut GameState,
        owner: PlayerId,
        data: CardData,
    ) -> PermanentId {
        let card = game.add_card_to_library(owner, data).unwrap();
        let id = game.enter_battlefield(card, owner).unwrap();
        game.permanents.get_mut(id).unwrap().summoning_sick = false;
        id
    }

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.logger = crate::game::GameLogger::silent();
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        (game, p1, p2)
    }

    #[test]
    fn test_evasion_matrix() {
        let mut flyer = creature_data("Wind Drake", 2, 2);
        flyer.keywords.push(Keyword::Flying);
        let flyer = make_permanent(flyer);

        let vanilla = make_permanent(creature_data("Bear", 2, 2));
        assert!(!can_block(&flyer, &vanilla));

        let mut spider = creature_data("Giant Spider", 2, 4);
        spider.keywords.push(Keyword::Reach);
        let spider = make_permanent(spider);
        assert!(can_block(&flyer, &spider));

        let mut intimidator = creature_data("Thug", 2, 2);
        intimidator.colors.push(ManaColor::Red);
        intimidator.keywords.push(Keyword::Intimidate);
        let intimidator = make_permanent(intimidator);

        let mut red_blocker = creature_data("Goblin", 1, 1);
        red_blocker.colors.push(ManaColor::Red);
        let red_blocker = make_permanent(red_blocker);
        assert!(can_block(&intimidator, &red_blocker));

        let mut green_blocker = creature_data("Elf", 1, 1);
        green_blocker.colors.push(ManaColor::Green);
        let green_blocker = make_permanent(green_blocker);
        assert!(!can_block(&intimidator, &green_blocker));

        let mut golem = creature_data("Golem", 3, 3);
        golem.types.push(CardType::Artifact);
        let golem = make_permanent(golem);
        assert!(can_block(&intimidator, &golem));
    }

    #[test]
    fn test_shadow_blocks_only_shadow() {
        let mut shade = creature_data("Shade", 1, 1);
        shade.keywords.push(Keyword::Shadow);
        let shade = make_permanent(shade);

        let vanilla = make_permanent(creature_data("Bear", 2, 2));
        assert!(!can_block(&shade, &vanilla));
        // And a shadow blocker cannot block a non-shadow attacker
        assert!(!can_block(&vanilla, &shade));

        let mut other_shade = creature_data("Other Shade", 1, 1);
        other_shade.keywords.push(Keyword::Shadow);
        let other_shade = make_permanent(other_shade);
        assert!(can_block(&shade, &other_shade));
    }

    #[test]
    fn test_fear_and_protection() {
        let mut fearsome = creature_data("Dread", 3, 3);
        fearsome.colors.push(ManaColor::Black);
        fearsome.keywords.push(Keyword::Fear);
        let fearsome = make_permanent(fearsome);

        let mut black_blocker = creature_data("Rat", 1, 1);
        black_blocker.colors.push(ManaColor::Black);
        assert!(can_block(&fearsome, &make_permanent(black_blocker)));

        let mut white_blocker = creature_data("Soldier", 1, 1);
        white_blocker.colors.push(ManaColor::White);
        assert!(!can_block(&fearsome, &make_permanent(white_blocker)));

        // Protection from black overrides an otherwise legal block
        let mut pro_black = creature_data("Knight", 2, 2);
        pro_black.colors.push(ManaColor::White);
        pro_black.keywords.push(Keyword::Protection(
            crate::core::ProtectionQuality::Color(ManaColor::White),
        ));
        let pro_white_attacker = make_permanent(pro_black);
        let mut white_b = creature_data("Cleric", 1, 1);
        white_b.colors.push(ManaColor::White);
        assert!(!can_block(&pro_white_attacker, &make_permanent(white_b)));
    }

    #[test]
    fn test_menace_needs_two_blockers() {
        let (mut game, p1, p2) = setup();
        let mut menace = creature_data("Ogre", 3, 3);
        menace.keywords.push(Keyword::Menace);
        let attacker = summon(&mut game, p1, menace);
        let b1 = summon(&mut game, p2, creature_data("Bear A", 2, 2));
        let b2 = summon(&mut game, p2, creature_data("Bear B", 2, 2));

        game.declare_attackers(p1, &[attacker]).unwrap();

        let err = game.declare_blockers(p2, &[(b1, attacker)]);
        assert!(matches!(err, Err(SimError::InvalidAction(_))));
        // Rejected assignment left nothing applied
        assert!(game.permanents.get(attacker).unwrap().blocked_by.is_empty());

        game.declare_blockers(p2, &[(b1, attacker), (b2, attacker)])
            .unwrap();
        assert_eq!(game.permanents.get(attacker).unwrap().blocked_by.len(), 2);
    }

    #[test]
    fn test_attack_requirements() {
        let (mut game, p1, _) = setup();
        let sick = {
            let card = game
                .add_card_to_library(p1, creature_data("Fresh Bear", 2, 2))
                .unwrap();
            game.enter_battlefield(card, p1).unwrap()
        };
        assert!(matches!(
            game.declare_attackers(p1, &[sick]),
            Err(SimError::IllegalTiming(_))
        ));

        let mut wall_data = creature_data("Wall", 0, 4);
        wall_data.keywords.push(Keyword::Defender);
        let wall = summon(&mut game, p1, wall_data);
        assert!(game.declare_attackers(p1, &[wall]).is_err());
    }

    #[test]
    fn test_vigilance_attacker_stays_untapped() {
        let (mut game, p1, _) = setup();
        let mut vigilant = creature_data("Sentry", 2, 2);
        vigilant.keywords.push(Keyword::Vigilance);
        let a = summon(&mut game, p1, vigilant);
        let b = summon(&mut game, p1, creature_data("Bear", 2, 2));

        game.declare_attackers(p1, &[a, b]).unwrap();
        assert!(!game.permanents.get(a).unwrap().tapped);
        assert!(game.permanents.get(b).unwrap().tapped);
    }

    #[test]
    fn test_first_strike_kills_before_regular_damage() {
        let (mut game, p1, p2) = setup();
        let mut striker = creature_data("White Knight", 3, 2);
        striker.keywords.push(Keyword::FirstStrike);
        let attacker = summon(&mut game, p1, striker);
        let blocker = summon(&mut game, p2, creature_data("Bear", 2, 2));

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.declare_blockers(p2, &[(blocker, attacker)]).unwrap();
        game.resolve_combat_damage().unwrap();

        // Blocker died in the first-strike step and never dealt damage
        assert!(game.permanents.get(blocker).is_err());
        let knight = game.permanents.get(attacker).unwrap();
        assert_eq!(knight.damage, 0);
    }

    #[test]
    fn test_double_strike_deals_in_both_steps() {
        let (mut game, p1, p2) = setup();
        let mut striker = creature_data("Fencing Ace", 1, 1);
        striker.keywords.push(Keyword::DoubleStrike);
        let attacker = summon(&mut game, p1, striker);

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(p2).unwrap().life, 18);
    }

    #[test]
    fn test_unblocked_lifelink_attacker() {
        let (mut game, p1, p2) = setup();
        let mut vampire = creature_data("Vampire", 3, 3);
        vampire.keywords.push(Keyword::Lifelink);
        let attacker = summon(&mut game, p1, vampire);

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.resolve_combat_damage().unwrap();

        assert_eq!(game.get_player(p2).unwrap().life, 17);
        assert_eq!(game.get_player(p1).unwrap().life, 23);
    }

    #[test]
    fn test_trample_excess_hits_player() {
        let (mut game, p1, p2) = setup();
        let mut wurm = creature_data("Wurm", 6, 6);
        wurm.keywords.push(Keyword::Trample);
        let attacker = summon(&mut game, p1, wurm);
        let blocker = summon(&mut game, p2, creature_data("Bear", 2, 2));

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.declare_blockers(p2, &[(blocker, attacker)]).unwrap();
        game.resolve_combat_damage().unwrap();

        assert!(game.permanents.get(blocker).is_err());
        // 2 to the blocker, 4 through
        assert_eq!(game.get_player(p2).unwrap().life, 16);
    }

    #[test]
    fn test_blocked_attacker_without_trample_hits_no_player() {
        let (mut game, p1, p2) = setup();
        let attacker = summon(&mut game, p1, creature_data("Giant", 5, 5));
        let blocker = summon(&mut game, p2, creature_data("Bear", 2, 2));

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.declare_blockers(p2, &[(blocker, attacker)]).unwrap();
        game.resolve_combat_damage().unwrap();

        // All 5 damage soaked by the lone blocker
        assert_eq!(game.get_player(p2).unwrap().life, 20);
        assert_eq!(game.permanents.get(attacker).unwrap().damage, 2);
    }

    #[test]
    fn test_mutual_trade() {
        let (mut game, p1, p2) = setup();
        let attacker = summon(&mut game, p1, creature_data("Bear A", 2, 2));
        let blocker = summon(&mut game, p2, creature_data("Bear B", 2, 2));

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.declare_blockers(p2, &[(blocker, attacker)]).unwrap();
        game.resolve_combat_damage().unwrap();

        // Simultaneous staging: both die even though either death would
        // have prevented the other's damage under naive ordering
        assert!(game.permanents.get(attacker).is_err());
        assert!(game.permanents.get(blocker).is_err());
    }

    #[test]
    fn test_deathtouch_blocker_kills_big_attacker() {
        let (mut game, p1, p2) = setup();
        let attacker = summon(&mut game, p1, creature_data("Giant", 5, 5));
        let mut snake = creature_data("Snake", 1, 1);
        snake.keywords.push(Keyword::Deathtouch);
        let blocker = summon(&mut game, p2, snake);

        game.declare_attackers(p1, &[attacker]).unwrap();
        game.declare_blockers(p2, &[(blocker, attacker)]).unwrap();
        game.resolve_combat_damage().unwrap();

        assert!(game.permanents.get(attacker).is_err());
        assert!(game.permanents.get(blocker).is_err());
    }
}
