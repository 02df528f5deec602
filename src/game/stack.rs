//! The stack: LIFO container of pending spells and abilities
//!
//! Items resolve strictly top-first. There is deliberately no reordering
//! primitive; the game has no such operation.

use crate::core::{Ability, CardId, PermanentId, PlayerId, StackId, Target};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The resolvable payload of a stack item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StackPayload {
    /// A spell: the card being cast
    Spell { card_id: CardId },
    /// An activated ability and the permanent it came from
    Ability {
        source: PermanentId,
        ability: Ability,
    },
}

/// One pending spell or ability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackItem {
    pub id: StackId,

    /// Player who cast/activated this item
    pub caster: PlayerId,

    pub payload: StackPayload,

    /// Targets chosen at cast time, in effect order
    pub targets: SmallVec<[Target; 2]>,

    /// Set only when a countering effect RESOLVES, never at cast time.
    /// A countered item is discarded without effect when popped.
    pub countered: bool,
}

impl StackItem {
    pub fn is_spell(&self) -> bool {
        matches!(self.payload, StackPayload::Spell { .. })
    }
}

/// LIFO stack of pending items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stack {
    items: Vec<StackItem>,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    pub fn push(&mut self, item: StackItem) {
        self.items.push(item);
    }

    /// Remove and return the top item.
    ///
    /// Panics if the stack is empty: priority bookkeeping guarantees the
    /// stack is non-empty whenever a resolution is triggered, so an empty
    /// pop is a programming error, not a game state.
    pub fn pop(&mut self) -> StackItem {
        self.items
            .pop()
            .expect("stack underflow: resolution triggered with empty stack")
    }

    pub fn peek(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: StackId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Mark a pending item as countered. Returns false if the item is no
    /// longer on the stack (already resolved or removed), in which case
    /// the countering effect fizzles harmlessly.
    pub fn mark_countered(&mut self, id: StackId) -> bool {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.countered = true;
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackItem> {
        self.items.iter()
    }
}
