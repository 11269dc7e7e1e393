//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains every rule of the game and the state machine that
//! sequences them. It has **no dependency** on a terminal, audio or the clock
//! on the wall:
//!
//! - **Deterministic**: same settings, seed and input frames give the same game
//! - **Testable**: every rule is reachable without a renderer
//! - **Fixed step**: time only moves when [`Session::tick`] is called
//!
//! # Module Structure
//!
//! - [`board`]: the playfield grid, collision queries and row removal
//! - [`pieces`]: tetromino shapes, the active piece, rotation and SRS kicks
//! - [`rng`]: pluggable piece sequence strategies (7-bag, uniform, scripted)
//! - [`repeater`]: DAS/ARR key repetition
//! - [`gravity`]: gravity accumulator and lock delay with a reset budget
//! - [`scoring`]: line and drop points, levels, bonus rules and T-spin detection
//! - [`session`]: the Spawning → Falling → Locking → LineClear state machine
//! - [`config`]: tuning settings, presets and validation
//! - [`snapshot`]: the read-only render view
//!
//! # Example
//!
//! ```
//! use starfall_core::{Session, Settings};
//! use starfall_core::types::{Action, SoundEvent};
//!
//! let mut settings = Settings::modern();
//! settings.timing.entry_delay = 0;
//!
//! let mut session = Session::builder(settings).seed(12345).build().unwrap();
//! session.press(Action::HardDrop);
//! session.tick();
//!
//! assert!(session.score() > 0); // hard drop awards points per cell
//! assert!(session.take_events().contains(&SoundEvent::Lock));
//! ```
//!
//! # Timing
//!
//! Settings are in milliseconds; the session runs at `TARGET_FPS` and converts
//! each duration to exact frame counts (see [`timing`]). Call
//! [`Session::tick`] once per frame and feed key events through
//! [`Session::push_input`] in between.

pub mod board;
pub mod config;
pub mod error;
pub mod gravity;
pub mod pieces;
pub mod repeater;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod timing;

pub use starfall_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use config::{Capabilities, Capability, Settings};
pub use error::ConfigError;
pub use pieces::{Piece, RotationSystem};
pub use rng::{BagRandomizer, Randomizer, RandomizerKind, ScriptedRandomizer, SimpleRng};
pub use scoring::{BonusRule, ClearContext, GuidelineBonus, NoBonus, ScoreResult};
pub use session::{Session, SessionBuilder};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
