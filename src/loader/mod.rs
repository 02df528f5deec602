//! Loaders: card scripts, deck lists, databases and game assembly

pub mod card;
pub mod database;
pub mod deck;
pub mod game_init;

pub use card::CardLoader;
pub use database::CardDatabase;
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::Game;
