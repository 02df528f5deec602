//! Deck list loader
//!
//! Deck lists are `count name` lines, with optional `[Sideboard]` /
//! `[Main]` section headers and `#` comments:
//!
//! ```text
//! # Mono red
//! 20 Mountain
//! 40 Lightning Bolt
//! [Sideboard]
//! 4 Shock
//! ```

use crate::{Result, SimError};
use std::fs;
use std::path::Path;

pub struct DeckLoader;

impl DeckLoader {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("deck")
            .to_string();
        let mut deck = Self::parse(&content)?;
        deck.name = name;
        Ok(deck)
    }

    pub fn parse(content: &str) -> Result<DeckList> {
        let mut main_deck = Vec::new();
        let mut sideboard = Vec::new();
        let mut in_sideboard = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_sideboard = line.to_lowercase().contains("sideboard");
                continue;
            }

            let (count_str, rest) = line.split_once(' ').ok_or_else(|| {
                SimError::InvalidDeckFormat(format!("bad deck line: {line}"))
            })?;
            let count: u8 = count_str.parse().map_err(|_| {
                SimError::InvalidDeckFormat(format!("bad count in line: {line}"))
            })?;
            // A trailing |SET tag is allowed and ignored
            let card_name = match rest.split_once('|') {
                Some((name, _set)) => name.trim().to_string(),
                None => rest.trim().to_string(),
            };
            let entry = DeckEntry { card_name, count };
            if in_sideboard {
                sideboard.push(entry);
            } else {
                main_deck.push(entry);
            }
        }

        if main_deck.is_empty() {
            return Err(SimError::InvalidDeckFormat("empty deck".to_string()));
        }
        Ok(DeckList {
            name: "deck".to_string(),
            main_deck,
            sideboard,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// An ordered deck list (order becomes initial library order, before
/// shuffling)
#[derive(Debug, Clone)]
pub struct DeckList {
    pub name: String,
    pub main_deck: Vec<DeckEntry>,
    pub sideboard: Vec<DeckEntry>,
}

impl DeckList {
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deck() {
        let deck = DeckLoader::parse(
            "# comment\n20 Mountain\n40 Lightning Bolt|M10\n[Sideboard]\n4 Shock\n",
        )
        .unwrap();
        assert_eq!(deck.main_deck.len(), 2);
        assert_eq!(deck.total_cards(), 60);
        assert_eq!(deck.main_deck[1].card_name, "Lightning Bolt");
        assert_eq!(deck.sideboard.len(), 1);
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert!(matches!(
            DeckLoader::parse("# nothing here\n"),
            Err(SimError::InvalidDeckFormat(_))
        ));
    }

    #[test]
    fn test_bad_count_rejected() {
        assert!(DeckLoader::parse("twenty Mountain\n").is_err());
    }
}
