//! Core game types and entities

pub mod ability;
pub mod card;
pub mod entity;
pub mod mana;
pub mod permanent;
pub mod player;

pub use ability::{Ability, AbilityCost, AbilityKind, Duration, Effect, Target, TargetSpec, Timing};
pub use card::{Card, CardData, CardType, Keyword, ProtectionQuality};
pub use entity::{CardId, EntityId, EntityStore, PermanentId, PlayerId, StackId};
pub use mana::{ManaColor, ManaCost, ManaPool};
pub use permanent::{Permanent, PermanentKind};
pub use player::Player;
