//! Game event logger
//!
//! Deterministic game-event output: what a game prints is part of its
//! observable behavior for replay comparison, so logging goes through one
//! owned logger per game rather than a global facade. Output can go to
//! stdout, an in-memory buffer (batch simulation keeps games silent), or
//! both.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Verbosity level for game output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum VerbosityLevel {
    /// No output at all
    Silent,
    /// Game results only
    Minimal,
    /// Turn/step headers and major events
    #[default]
    Normal,
    /// Every engine decision
    Verbose,
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Stdout,
    Memory,
    Both,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        GameLogger::default()
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            ..GameLogger::default()
        }
    }

    pub fn silent() -> Self {
        Self::with_verbosity(VerbosityLevel::Silent)
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn log(&self, level: VerbosityLevel, message: &str) {
        if self.verbosity == VerbosityLevel::Silent || level > self.verbosity {
            return;
        }
        match self.output_mode {
            OutputMode::Stdout => println!("{message}"),
            OutputMode::Memory => self.buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
            }),
            OutputMode::Both => {
                println!("{message}");
                self.buffer.borrow_mut().push(LogEntry {
                    level,
                    message: message.to_string(),
                });
            }
        }
    }

    /// Game results and other always-interesting lines
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message);
    }

    /// Turn/step headers, casts, combat events
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message);
    }

    /// Per-decision detail
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message);
    }

    /// Captured entries (Memory/Both modes)
    pub fn entries(&self) -> Vec<LogEntry> {
        self.buffer.borrow().clone()
    }
}

impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            buffer: RefCell::new(self.buffer.borrow().clone()),
        }
    }
}
