//! Card file loader and ability script parser
//!
//! Cards are plain text, one `Key:Value` pair per line:
//!
//! ```text
//! Name:Lightning Bolt
//! ManaCost:{R}
//! Types:Instant
//! A:SP$ DealDamage | NumDmg$ 3 | ValidTgts$ Any
//! Oracle:Lightning Bolt deals 3 damage to any target.
//! ```
//!
//! `K:` lines carry keywords. `A:` lines are ability scripts: `SP$`
//! effects run when an instant/sorcery resolves, `AB$` defines an
//! activated ability with a `Cost$` (T for tap, mana symbols for mana).
//! The engine only ever sees the structured output; oracle text is
//! display-only.

use crate::core::{
    Ability, AbilityCost, AbilityKind, CardData, CardType, Duration, Effect, Keyword, ManaColor,
    ManaCost, ProtectionQuality, TargetSpec, Timing,
};
use crate::{Result, SimError};
use smallvec::{smallvec, SmallVec};
use std::fs;
use std::path::Path;

/// Loader for card script files
pub struct CardLoader;

impl CardLoader {
    pub fn load_from_file(path: &Path) -> Result<CardData> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse one card from its script text
    pub fn parse(content: &str) -> Result<CardData> {
        let mut name = None;
        let mut mana_cost = ManaCost::new();
        let mut types: SmallVec<[CardType; 2]> = SmallVec::new();
        let mut keywords: SmallVec<[Keyword; 4]> = SmallVec::new();
        let mut ability_lines = Vec::new();
        let mut power = None;
        let mut toughness = None;
        let mut oracle = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                SimError::InvalidCardFormat(format!("missing ':' in line: {line}"))
            })?;
            let value = value.trim();

            match key.trim() {
                "Name" => name = Some(value.to_string()),
                "ManaCost" => {
                    mana_cost = if value == "no cost" {
                        ManaCost::new()
                    } else {
                        ManaCost::parse(value)?
                    }
                }
                "Types" => {
                    for part in value.split_whitespace() {
                        match part {
                            "Creature" => types.push(CardType::Creature),
                            "Instant" => types.push(CardType::Instant),
                            "Sorcery" => types.push(CardType::Sorcery),
                            "Enchantment" => types.push(CardType::Enchantment),
                            "Artifact" => types.push(CardType::Artifact),
                            "Land" => types.push(CardType::Land),
                            "Planeswalker" => types.push(CardType::Planeswalker),
                            // Subtypes (Goblin, Forest, ...) are not modeled
                            _ => {}
                        }
                    }
                }
                "PT" => {
                    let (p, t) = value.split_once('/').ok_or_else(|| {
                        SimError::InvalidCardFormat(format!("bad PT line: {value}"))
                    })?;
                    power = Some(p.trim().parse().map_err(|_| {
                        SimError::InvalidCardFormat(format!("bad power: {p}"))
                    })?);
                    toughness = Some(t.trim().parse().map_err(|_| {
                        SimError::InvalidCardFormat(format!("bad toughness: {t}"))
                    })?);
                }
                "K" => {
                    keywords.push(parse_keyword(value)?);
                }
                "A" => ability_lines.push(value.to_string()),
                "Oracle" => oracle = value.to_string(),
                _ => {}
            }
        }

        let name =
            name.ok_or_else(|| SimError::InvalidCardFormat("missing card name".to_string()))?;

        let mut data = CardData::new(name);
        data.types = types;
        data.keywords = keywords;
        data.power = power;
        data.toughness = toughness;
        data.text = oracle;
        data.colors = card_colors(&mana_cost);
        data.mana_cost = mana_cost;

        for line in &ability_lines {
            match parse_ability_script(line)? {
                ParsedAbility::Activated(ability) => data.abilities.push(ability),
                ParsedAbility::SpellEffects(effects) => data.spell_effects.extend(effects),
            }
        }
        Ok(data)
    }
}

/// Colors a card has, derived from the colored symbols in its cost
fn card_colors(cost: &ManaCost) -> SmallVec<[ManaColor; 2]> {
    [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ]
    .into_iter()
    .filter(|&c| cost.colored(c) > 0)
    .collect()
}

fn parse_keyword(s: &str) -> Result<Keyword> {
    let keyword = match s {
        "Flying" => Keyword::Flying,
        "Reach" => Keyword::Reach,
        "First Strike" => Keyword::FirstStrike,
        "Double Strike" => Keyword::DoubleStrike,
        "Deathtouch" => Keyword::Deathtouch,
        "Lifelink" => Keyword::Lifelink,
        "Trample" => Keyword::Trample,
        "Haste" => Keyword::Haste,
        "Vigilance" => Keyword::Vigilance,
        "Indestructible" => Keyword::Indestructible,
        "Flash" => Keyword::Flash,
        "Defender" => Keyword::Defender,
        "Menace" => Keyword::Menace,
        "Intimidate" => Keyword::Intimidate,
        "Shadow" => Keyword::Shadow,
        "Fear" => Keyword::Fear,
        _ => {
            let quality = s.strip_prefix("Protection from ").ok_or_else(|| {
                SimError::InvalidCardFormat(format!("unknown keyword: {s}"))
            })?;
            let quality = match quality {
                "white" => ProtectionQuality::Color(ManaColor::White),
                "blue" => ProtectionQuality::Color(ManaColor::Blue),
                "black" => ProtectionQuality::Color(ManaColor::Black),
                "red" => ProtectionQuality::Color(ManaColor::Red),
                "green" => ProtectionQuality::Color(ManaColor::Green),
                "artifacts" => ProtectionQuality::Artifacts,
                _ => {
                    return Err(SimError::InvalidCardFormat(format!(
                        "unknown protection quality: {quality}"
                    )))
                }
            };
            Keyword::Protection(quality)
        }
    };
    Ok(keyword)
}

enum ParsedAbility {
    Activated(Ability),
    SpellEffects(Vec<Effect>),
}

/// Parse one `A:` script line into structured form.
///
/// Segments are pipe-separated `Key$ Value` pairs; the first segment
/// names the mode (`AB$`/`SP$`) and effect verb.
fn parse_ability_script(line: &str) -> Result<ParsedAbility> {
    let mut segments = line.split('|').map(str::trim);
    let head = segments
        .next()
        .ok_or_else(|| SimError::ParseError(format!("empty ability script: {line}")))?;
    let (mode, verb) = split_pair(head)?;

    let mut params: Vec<(String, String)> = Vec::new();
    for segment in segments {
        let (key, value) = split_pair(segment)?;
        params.push((key.to_string(), value.to_string()));
    }
    let effect = parse_effect(verb, &params)?;

    match mode {
        "SP" => Ok(ParsedAbility::SpellEffects(vec![effect])),
        "AB" => {
            let cost = parse_cost(lookup(&params, "Cost").unwrap_or("T"))?;
            let timing = match lookup(&params, "Timing") {
                Some("Sorcery") => Timing::SorcerySpeed,
                _ => Timing::InstantSpeed,
            };
            let kind = if matches!(effect, Effect::AddMana { .. }) {
                AbilityKind::Mana
            } else {
                AbilityKind::Activated
            };
            Ok(ParsedAbility::Activated(Ability {
                kind,
                cost,
                timing,
                effects: vec![effect],
            }))
        }
        _ => Err(SimError::ParseError(format!(
            "unknown ability mode: {mode}"
        ))),
    }
}

fn split_pair(segment: &str) -> Result<(&str, &str)> {
    let (key, value) = segment
        .split_once('$')
        .ok_or_else(|| SimError::ParseError(format!("missing '$' in segment: {segment}")))?;
    Ok((key.trim(), value.trim()))
}

fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_effect(verb: &str, params: &[(String, String)]) -> Result<Effect> {
    let parse_num = |key: &str, default: i32| -> Result<i32> {
        match lookup(params, key) {
            Some(v) => v
                .parse()
                .map_err(|_| SimError::ParseError(format!("bad number for {key}: {v}"))),
            None => Ok(default),
        }
    };
    let target = || -> Result<TargetSpec> {
        match lookup(params, "ValidTgts") {
            Some("Any") => Ok(TargetSpec::AnyTarget),
            Some("Creature") => Ok(TargetSpec::TargetCreature),
            Some("Player") => Ok(TargetSpec::TargetPlayer),
            Some("Spell") => Ok(TargetSpec::TargetSpell),
            Some(other) => Err(SimError::ParseError(format!("unknown target: {other}"))),
            None => Ok(TargetSpec::None),
        }
    };

    match verb {
        "DealDamage" => Ok(Effect::DealDamage {
            amount: parse_num("NumDmg", 1)?,
            target: match target()? {
                TargetSpec::None => TargetSpec::AnyTarget,
                spec => spec,
            },
        }),
        "Mana" => {
            let produced = lookup(params, "Produced").unwrap_or("C");
            let colors = if produced == "Any" {
                smallvec![
                    ManaColor::White,
                    ManaColor::Blue,
                    ManaColor::Black,
                    ManaColor::Red,
                    ManaColor::Green,
                ]
            } else {
                produced
                    .split_whitespace()
                    .map(parse_color)
                    .collect::<Result<SmallVec<[ManaColor; 2]>>>()?
            };
            Ok(Effect::AddMana { colors })
        }
        "Pump" => Ok(Effect::ModifyStats {
            power: parse_num("NumAtt", 0)?,
            toughness: parse_num("NumDef", 0)?,
            duration: Duration::EndOfTurn,
            target: match target()? {
                TargetSpec::None => TargetSpec::TargetCreature,
                spec => spec,
            },
        }),
        "GainLife" => Ok(Effect::GainLife {
            amount: parse_num("LifeAmount", 1)?,
        }),
        "Draw" => {
            let count = parse_num("NumCards", 1)?;
            let count = u8::try_from(count)
                .map_err(|_| SimError::ParseError(format!("NumCards out of range: {count}")))?;
            Ok(Effect::DrawCards { count })
        }
        "Destroy" => Ok(Effect::Destroy {
            target: match target()? {
                TargetSpec::None => TargetSpec::TargetCreature,
                spec => spec,
            },
        }),
        "Counter" => Ok(Effect::CounterSpell),
        _ => Err(SimError::ParseError(format!("unknown effect: {verb}"))),
    }
}

fn parse_color(s: &str) -> Result<ManaColor> {
    match s {
        "W" => Ok(ManaColor::White),
        "U" => Ok(ManaColor::Blue),
        "B" => Ok(ManaColor::Black),
        "R" => Ok(ManaColor::Red),
        "G" => Ok(ManaColor::Green),
        "C" => Ok(ManaColor::Colorless),
        _ => Err(SimError::ParseError(format!("unknown color: {s}"))),
    }
}

/// `Cost$` value: space-separated tokens, `T` for tap plus optional mana
/// symbols (`T {1}{R}`)
fn parse_cost(s: &str) -> Result<AbilityCost> {
    let mut cost = AbilityCost::default();
    for token in s.split_whitespace() {
        if token == "T" {
            cost.tap = true;
        } else {
            cost.mana = ManaCost::parse(token)?;
        }
    }
    Ok(cost)
}
