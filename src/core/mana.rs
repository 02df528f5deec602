//! Mana pools and mana costs
//!
//! Mana is modeled as a keyed mapping from mana category to count rather
//! than fixed per-color struct fields, so hybrid and unusual categories
//! extend without type proliferation. "Generic" is a cost-side concept
//! only (payable with any mana); "colorless" ({C}) is a real pool
//! category distinct from the five colors.

use crate::{Result, SimError};
use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::map,
    multi::many1,
    sequence::delimited,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mana categories a pool can hold
///
/// Ordered WUBRG then colorless; `BTreeMap` keyed by this enum iterates
/// in that order, which keeps payment deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManaColor {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl ManaColor {
    /// The order generic costs are paid in: colorless is spent first so
    /// colored mana stays available for strict requirements.
    pub const PAYMENT_ORDER: [ManaColor; 6] = [
        ManaColor::Colorless,
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    pub fn symbol(&self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
            ManaColor::Colorless => 'C',
        }
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A mana requirement: strict per-color components plus a generic
/// component payable by any category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    colored: BTreeMap<ManaColor, u8>,
    generic: u8,
}

/// One `{...}` symbol in a printed cost
enum Symbol {
    Generic(u8),
    Color(ManaColor),
    X,
}

fn symbol(input: &str) -> IResult<&str, Symbol> {
    delimited(
        char('{'),
        alt((
            map(digit1, |d: &str| Symbol::Generic(d.parse().unwrap_or(0))),
            map(one_of("WUBRGC"), |c| {
                Symbol::Color(match c {
                    'W' => ManaColor::White,
                    'U' => ManaColor::Blue,
                    'B' => ManaColor::Black,
                    'R' => ManaColor::Red,
                    'G' => ManaColor::Green,
                    _ => ManaColor::Colorless,
                })
            }),
            map(one_of("Xx"), |_| Symbol::X),
        )),
        char('}'),
    )(input)
}

impl ManaCost {
    pub fn new() -> Self {
        ManaCost::default()
    }

    /// Parse a bracketed cost string like `{2}{R}{G}`.
    ///
    /// `{X}` symbols are rejected here; use [`ManaCost::parse_with_x`]
    /// with the already-resolved X value. The engine never resolves X
    /// interactively.
    pub fn parse(s: &str) -> Result<Self> {
        let cost = Self::parse_with_x(s, 0)?;
        if s.contains('X') || s.contains('x') {
            return Err(SimError::ParseError(format!(
                "cost {s} contains {{X}}; supply a resolved X value"
            )));
        }
        Ok(cost)
    }

    /// Parse a cost string, substituting the caller-resolved value for
    /// every `{X}` symbol.
    pub fn parse_with_x(s: &str, x: u8) -> Result<Self> {
        let mut cost = ManaCost::new();
        if s.is_empty() {
            return Ok(cost);
        }
        let (rest, symbols) = many1(symbol)(s)
            .map_err(|_| SimError::ParseError(format!("bad mana cost syntax: {s}")))?;
        if !rest.is_empty() {
            return Err(SimError::ParseError(format!(
                "trailing input in mana cost {s}: {rest}"
            )));
        }
        for sym in symbols {
            match sym {
                Symbol::Generic(n) => cost.generic = cost.generic.saturating_add(n),
                Symbol::Color(c) => cost.add_colored(c, 1),
                Symbol::X => cost.generic = cost.generic.saturating_add(x),
            }
        }
        Ok(cost)
    }

    pub fn with_generic(mut self, amount: u8) -> Self {
        self.generic += amount;
        self
    }

    pub fn with_colored(mut self, color: ManaColor, amount: u8) -> Self {
        self.add_colored(color, amount);
        self
    }

    pub fn add_colored(&mut self, color: ManaColor, amount: u8) {
        if amount > 0 {
            *self.colored.entry(color).or_insert(0) += amount;
        }
    }

    pub fn colored(&self, color: ManaColor) -> u8 {
        self.colored.get(&color).copied().unwrap_or(0)
    }

    pub fn generic(&self) -> u8 {
        self.generic
    }

    /// Total converted mana cost
    pub fn cmc(&self) -> u32 {
        self.generic as u32 + self.colored.values().map(|&n| n as u32).sum::<u32>()
    }

    pub fn is_free(&self) -> bool {
        self.generic == 0 && self.colored.values().all(|&n| n == 0)
    }

    fn colored_entries(&self) -> impl Iterator<Item = (ManaColor, u8)> + '_ {
        self.colored.iter().map(|(&c, &n)| (c, n))
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for (color, count) in &self.colored {
            for _ in 0..*count {
                write!(f, "{{{color}}}")?;
            }
        }
        if self.is_free() {
            write!(f, "{{0}}")?;
        }
        Ok(())
    }
}

/// A player's mana pool: category -> non-negative count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaPool {
    counts: BTreeMap<ManaColor, u8>,
}

impl ManaPool {
    pub fn new() -> Self {
        ManaPool::default()
    }

    pub fn add(&mut self, color: ManaColor, amount: u8) {
        if amount > 0 {
            *self.counts.entry(color).or_insert(0) += amount;
        }
    }

    pub fn amount(&self, color: ManaColor) -> u8 {
        self.counts.get(&color).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().map(|&n| n as u32).sum()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Pure predicate: can this pool pay `cost`?
    ///
    /// Each strictly-colored requirement is checked independently (no
    /// borrowing across colors), then the generic remainder must be
    /// covered by whatever is left across all categories.
    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        let mut reserved: u32 = 0;
        for (color, required) in cost.colored_entries() {
            if self.amount(color) < required {
                return false;
            }
            reserved += required as u32;
        }
        self.total() - reserved >= cost.generic() as u32
    }

    /// Pay `cost` from this pool, atomically.
    ///
    /// Colored requirements are deducted directly; the generic component
    /// consumes colorless mana first, then remaining colors in WUBRG
    /// order. Fails without any deduction if the pool cannot cover the
    /// cost.
    pub fn pay(&mut self, cost: &ManaCost) -> Result<()> {
        if !self.can_pay(cost) {
            return Err(SimError::InsufficientMana {
                cost: cost.to_string(),
                pool: self.to_string(),
            });
        }

        for (color, required) in cost.colored_entries() {
            if let Some(count) = self.counts.get_mut(&color) {
                *count -= required;
            }
        }

        let mut generic_remaining = cost.generic();
        for color in ManaColor::PAYMENT_ORDER {
            if generic_remaining == 0 {
                break;
            }
            let available = self.amount(color);
            let used = generic_remaining.min(available);
            if used > 0 {
                if let Some(count) = self.counts.get_mut(&color) {
                    *count -= used;
                }
                generic_remaining -= used;
            }
        }

        debug_assert_eq!(generic_remaining, 0, "generic payment left unpaid");
        Ok(())
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }
        for (color, count) in &self.counts {
            if *count > 0 {
                write!(f, "{count}{color} ")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: &[(ManaColor, u8)]) -> ManaPool {
        let mut p = ManaPool::new();
        for &(c, n) in entries {
            p.add(c, n);
        }
        p
    }

    #[test]
    fn test_parse_cost() {
        let cost = ManaCost::parse("{2}{R}{R}").unwrap();
        assert_eq!(cost.generic(), 2);
        assert_eq!(cost.colored(ManaColor::Red), 2);
        assert_eq!(cost.cmc(), 4);

        let cost = ManaCost::parse("{1}{U}{B}").unwrap();
        assert_eq!(cost.generic(), 1);
        assert_eq!(cost.colored(ManaColor::Blue), 1);
        assert_eq!(cost.colored(ManaColor::Black), 1);
        assert_eq!(cost.cmc(), 3);

        // Colorless requirement is distinct from generic
        let cost = ManaCost::parse("{C}{C}").unwrap();
        assert_eq!(cost.generic(), 0);
        assert_eq!(cost.colored(ManaColor::Colorless), 2);
    }

    #[test]
    fn test_parse_x_cost() {
        assert!(ManaCost::parse("{X}{R}").is_err());

        let cost = ManaCost::parse_with_x("{X}{R}", 4).unwrap();
        assert_eq!(cost.generic(), 4);
        assert_eq!(cost.colored(ManaColor::Red), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ManaCost::parse("2RR").is_err());
        assert!(ManaCost::parse("{2}{Q}").is_err());
    }

    #[test]
    fn test_empty_cost_always_payable() {
        let cost = ManaCost::new();
        assert!(ManaPool::new().can_pay(&cost));
        assert!(ManaPool::new().pay(&cost).is_ok());
    }

    #[test]
    fn test_colored_requirements_independent() {
        // {R}{R} cannot be paid with UU even though the totals match
        let p = pool(&[(ManaColor::Blue, 2)]);
        let cost = ManaCost::parse("{R}{R}").unwrap();
        assert!(!p.can_pay(&cost));

        let mut p2 = p.clone();
        assert!(p2.pay(&cost).is_err());
        assert_eq!(p2, p); // untouched on failure
    }

    #[test]
    fn test_generic_covered_by_leftovers() {
        let p = pool(&[(ManaColor::Red, 1), (ManaColor::Green, 2)]);
        // {2}{R}: R reserved, generic 2 covered by the two green
        assert!(p.can_pay(&ManaCost::parse("{2}{R}").unwrap()));
        // {3}{R}: only 2 leftover after reserving R
        assert!(!p.can_pay(&ManaCost::parse("{3}{R}").unwrap()));
    }

    #[test]
    fn test_pay_prefers_colorless_for_generic() {
        let mut p = pool(&[(ManaColor::Colorless, 1), (ManaColor::White, 1), (ManaColor::Red, 1)]);
        p.pay(&ManaCost::parse("{1}{R}").unwrap()).unwrap();
        // Colorless spent on generic, white preserved
        assert_eq!(p.amount(ManaColor::Colorless), 0);
        assert_eq!(p.amount(ManaColor::White), 1);
        assert_eq!(p.amount(ManaColor::Red), 0);
    }

    #[test]
    fn test_scenario_from_design() {
        // Pool {R:2, G:1}, cost {R}{G}: payable, leaves {R:1, G:0};
        // then {R}{R} is not payable.
        let mut p = pool(&[(ManaColor::Red, 2), (ManaColor::Green, 1)]);
        let rg = ManaCost::new()
            .with_colored(ManaColor::Red, 1)
            .with_colored(ManaColor::Green, 1);
        assert!(p.can_pay(&rg));
        p.pay(&rg).unwrap();
        assert_eq!(p.amount(ManaColor::Red), 1);
        assert_eq!(p.amount(ManaColor::Green), 0);

        let rr = ManaCost::new().with_colored(ManaColor::Red, 2);
        assert!(!p.can_pay(&rr));
    }

    #[test]
    fn test_can_pay_agrees_with_pay() {
        // canPay(P,C) == true iff pay on a clone succeeds
        let pools = [
            pool(&[]),
            pool(&[(ManaColor::Red, 1)]),
            pool(&[(ManaColor::Red, 2), (ManaColor::Green, 1)]),
            pool(&[(ManaColor::Colorless, 3)]),
            pool(&[(ManaColor::White, 1), (ManaColor::Blue, 1), (ManaColor::Black, 1)]),
        ];
        let costs = [
            ManaCost::new(),
            ManaCost::parse("{1}").unwrap(),
            ManaCost::parse("{R}").unwrap(),
            ManaCost::parse("{2}{R}").unwrap(),
            ManaCost::parse("{C}").unwrap(),
            ManaCost::parse("{W}{U}{B}").unwrap(),
        ];
        for p in &pools {
            for c in &costs {
                let mut clone = p.clone();
                assert_eq!(
                    p.can_pay(c),
                    clone.pay(c).is_ok(),
                    "disagreement for pool {p} cost {c}"
                );
            }
        }
    }
}
