//! Error types for the deck simulator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// A mana cost could not be paid from the caster's pool.
    /// The cast or activation is aborted with no state mutated.
    #[error("insufficient mana: cost {cost} cannot be paid from pool {pool}")]
    InsufficientMana { cost: String, pool: String },

    /// A spell or ability was cast outside its legal timing window.
    #[error("illegal timing: {0}")]
    IllegalTiming(String),

    /// A required target does not exist or is illegal at cast time.
    /// (Targets that become illegal *after* casting cause a fizzle on
    /// resolution instead, which is not an error.)
    #[error("invalid target: {0}")]
    TargetInvalid(String),

    #[error("invalid game action: {0}")]
    InvalidAction(String),

    #[error("entity not found: {0}")]
    EntityNotFound(u32),

    #[error("invalid card format: {0}")]
    InvalidCardFormat(String),

    #[error("invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("card not in database: {0}")]
    UnknownCard(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
