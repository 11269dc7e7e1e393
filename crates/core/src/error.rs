//! Configuration errors.
//!
//! A session refuses to start on any of these. Runtime conditions such as a
//! blocked spawn are game states, not errors, and never appear here.

use thiserror::Error;

use crate::types::PieceKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("board must be at least 4 columns wide (got {0})")]
    ColsTooSmall(u8),
    #[error("board of {cols}x{rows} exceeds the supported maximum of {max_cols}x{max_rows}")]
    BoardTooLarge {
        cols: u8,
        rows: u16,
        max_cols: u8,
        max_rows: u16,
    },
    #[error("board needs at least one visible row")]
    NoVisibleRows,
    #[error("spawn position (row {row}, col {col}) puts the {kind:?} piece outside the board")]
    SpawnOutOfBounds { kind: PieceKind, row: i16, col: i16 },
    #[error("target frame rate must be non-zero")]
    ZeroFrameRate,
    #[error("gravity table is empty")]
    EmptyGravityTable,
    #[error("gravity table has no entry for level {0}")]
    GravityGap(u32),
    #[error("gravity table entry for level {0} is zero frames per row")]
    ZeroGravity(u32),
    #[error("line clear table must define exactly rows 1 to 4 (problem at key {0})")]
    LineClearTable(u32),
    #[error("lines per level must be non-zero")]
    ZeroLinesPerLevel,
    #[error("start level {start} is above max level {max}")]
    StartLevelAboveMax { start: u32, max: u32 },
    #[error("next preview count {count} exceeds the maximum of {max}")]
    PreviewTooLong { count: usize, max: usize },
    #[error("ghost alpha {0} is outside 0.0..=1.0")]
    GhostAlpha(f32),
    #[error("key {key:?} is bound to both {first} and {second}")]
    DuplicateBinding {
        key: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("starting board is {cols}x{rows} but the settings describe {expected_cols}x{expected_rows}")]
    BoardShape {
        cols: u8,
        rows: u16,
        expected_cols: u8,
        expected_rows: u16,
    },
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
