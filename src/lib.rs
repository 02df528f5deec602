//! decksim - Magic-style deck evaluation through batch game simulation
//!
//! Simulates two-player games between deck lists to statistically evaluate
//! decks. The rules-resolution core (priority/stack, mana payment, combat,
//! state-based actions) is deterministic and single-threaded per game;
//! batches of games run in parallel.

pub mod core;
pub mod game;
pub mod zones;
pub mod loader;
pub mod tournament;
pub mod error;

pub use error::{Result, SimError};
