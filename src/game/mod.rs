//! Game state, rules engine and turn driver

pub mod casting;
pub mod combat;
pub mod controller;
pub mod game_loop;
pub mod logger;
pub mod phase;
pub mod priority;
pub mod random_controller;
pub mod stack;
pub mod state;
pub mod state_based;
pub mod zero_controller;

pub use combat::{can_block, CombatStep};
pub use controller::{GameStateView, PlayerAction, PlayerController};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::{Phase, Step, TurnStructure};
pub use priority::{PassOutcome, PriorityManager};
pub use random_controller::RandomController;
pub use stack::{Stack, StackItem, StackPayload};
pub use state::GameState;
pub use zero_controller::ZeroController;
