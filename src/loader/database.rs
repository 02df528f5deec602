//! Card database: name to card-definition lookup
//!
//! Lookup keys are unicode-folded and lowercased so deck lists spelling
//! "AEther" or "Æther" (or differing in case) still resolve.

use crate::core::CardData;
use crate::loader::card::CardLoader;
use crate::Result;
use deunicode::deunicode;
use std::collections::HashMap;
use std::path::Path;

pub struct CardDatabase {
    cards: HashMap<String, CardData>,
}

fn normalize_name(name: &str) -> String {
    deunicode(name).to_lowercase()
}

impl CardDatabase {
    pub fn new() -> Self {
        CardDatabase {
            cards: HashMap::new(),
        }
    }

    /// Load every `.txt` card script under a directory (recursively)
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut db = CardDatabase::new();
        db.load_directory(dir)?;
        Ok(db)
    }

    fn load_directory(&mut self, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.load_directory(&path)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("txt") {
                let data = CardLoader::load_from_file(&path)?;
                self.add_card(data);
            }
        }
        Ok(())
    }

    pub fn add_card(&mut self, data: CardData) {
        self.cards.insert(normalize_name(&data.name), data);
    }

    pub fn get_card(&self, name: &str) -> Option<&CardData> {
        self.cards.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// A small built-in set, enough to run simulations without any card
    /// files on disk
    pub fn demo() -> Self {
        const SCRIPTS: &[&str] = &[
            "Name:Plains\nManaCost:no cost\nTypes:Land Plains\nA:AB$ Mana | Cost$ T | Produced$ W\n",
            "Name:Island\nManaCost:no cost\nTypes:Land Island\nA:AB$ Mana | Cost$ T | Produced$ U\n",
            "Name:Swamp\nManaCost:no cost\nTypes:Land Swamp\nA:AB$ Mana | Cost$ T | Produced$ B\n",
            "Name:Mountain\nManaCost:no cost\nTypes:Land Mountain\nA:AB$ Mana | Cost$ T | Produced$ R\n",
            "Name:Forest\nManaCost:no cost\nTypes:Land Forest\nA:AB$ Mana | Cost$ T | Produced$ G\n",
            "Name:Grizzly Bears\nManaCost:{1}{G}\nTypes:Creature Bear\nPT:2/2\n",
            "Name:Hill Giant\nManaCost:{3}{R}\nTypes:Creature Giant\nPT:3/3\n",
            "Name:Wind Drake\nManaCost:{2}{U}\nTypes:Creature Drake\nPT:2/2\nK:Flying\n",
            "Name:Giant Spider\nManaCost:{3}{G}\nTypes:Creature Spider\nPT:2/4\nK:Reach\n",
            "Name:White Knight\nManaCost:{W}{W}\nTypes:Creature Knight\nPT:2/2\nK:First Strike\nK:Protection from black\n",
            "Name:Serra Angel\nManaCost:{3}{W}{W}\nTypes:Creature Angel\nPT:4/4\nK:Flying\nK:Vigilance\n",
            "Name:Vampire Nighthawk\nManaCost:{1}{B}{B}\nTypes:Creature Vampire\nPT:2/3\nK:Flying\nK:Deathtouch\nK:Lifelink\n",
            "Name:Craw Wurm\nManaCost:{4}{G}{G}\nTypes:Creature Wurm\nPT:6/4\nK:Trample\n",
            "Name:Lightning Bolt\nManaCost:{R}\nTypes:Instant\nA:SP$ DealDamage | NumDmg$ 3 | ValidTgts$ Any\n",
            "Name:Shock\nManaCost:{R}\nTypes:Instant\nA:SP$ DealDamage | NumDmg$ 2 | ValidTgts$ Any\n",
            "Name:Cancel\nManaCost:{1}{U}{U}\nTypes:Instant\nA:SP$ Counter | ValidTgts$ Spell\n",
            "Name:Giant Growth\nManaCost:{G}\nTypes:Instant\nA:SP$ Pump | NumAtt$ 3 | NumDef$ 3 | ValidTgts$ Creature\n",
            "Name:Doom Blade\nManaCost:{1}{B}\nTypes:Instant\nA:SP$ Destroy | ValidTgts$ Creature\n",
            "Name:Divination\nManaCost:{2}{U}\nTypes:Sorcery\nA:SP$ Draw | NumCards$ 2\n",
            "Name:Healing Salve\nManaCost:{W}\nTypes:Instant\nA:SP$ GainLife | LifeAmount$ 3\n",
            "Name:Prodigal Sorcerer\nManaCost:{2}{U}\nTypes:Creature Wizard\nPT:1/1\nA:AB$ DealDamage | Cost$ T | NumDmg$ 1 | ValidTgts$ Any\n",
        ];

        let mut db = CardDatabase::new();
        for script in SCRIPTS {
            // Built-in scripts are compile-time constants; a parse
            // failure here is a bug caught by the tests below.
            if let Ok(data) = CardLoader::parse(script) {
                db.add_card(data);
            }
        }
        db
    }
}

impl Default for CardDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_set_loads() {
        let db = CardDatabase::demo();
        assert_eq!(db.len(), 21);
        assert!(db.contains("Lightning Bolt"));
        assert!(db.contains("Forest"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let db = CardDatabase::demo();
        assert!(db.get_card("lightning bolt").is_some());
        assert!(db.get_card("LIGHTNING BOLT").is_some());
        assert!(db.get_card("Storm Crow").is_none());
    }

    #[test]
    fn test_unicode_folding() {
        let mut db = CardDatabase::new();
        let data = CardLoader::parse("Name:Æther Vial\nManaCost:{1}\nTypes:Artifact\n").unwrap();
        db.add_card(data);
        assert!(db.get_card("AEther Vial").is_some());
    }
}
