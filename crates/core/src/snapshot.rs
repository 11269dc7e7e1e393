//! Read-only view of a session for renderers.
//!
//! Coordinates are relative to the visible field: row 0 is the first visible
//! row. Active cells still in the hidden buffer have negative rows and are
//! left for the renderer to skip.

use arrayvec::ArrayVec;

use crate::board::{ClearedRows, MAX_CLEARED_ROWS};
use crate::config::MAX_PREVIEW;
use crate::types::{Cell, PieceKind, Phase, Rotation, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub cells: [Square; 4],
}

/// In-flight timers, in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimersSnapshot {
    /// Remaining lock delay; 0 unless the piece is locking.
    pub lock_ms: u32,
    pub line_clear_ms: u32,
    pub line_clear_total_ms: u32,
    /// Remaining time on the level-up banner.
    pub level_up_ms: u32,
}

impl TimersSnapshot {
    /// 0.0 when the clear animation starts, 1.0 when the rows are removed.
    pub fn line_clear_progress(&self) -> f32 {
        if self.line_clear_total_ms == 0 {
            return 1.0;
        }
        let elapsed = self.line_clear_total_ms.saturating_sub(self.line_clear_ms);
        elapsed as f32 / self.line_clear_total_ms as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub width: u8,
    /// Visible rows.
    pub height: u8,
    /// Row-major visible cells.
    pub board: Vec<Cell>,
    pub active: Option<ActiveSnapshot>,
    /// Landing position of the active piece, when the ghost is enabled.
    pub ghost: Option<[Square; 4]>,
    pub ghost_alpha: f32,
    pub hold: Option<PieceKind>,
    pub can_hold: bool,
    pub next: ArrayVec<PieceKind, MAX_PREVIEW>,
    /// Visible rows being animated away during a line clear.
    pub clearing: ArrayVec<i8, MAX_CLEARED_ROWS>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    /// Cleared lines still needed for the next level-up.
    pub lines_to_next_level: u32,
    pub phase: Phase,
    pub timers: TimersSnapshot,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.board.fill(None);
        self.active = None;
        self.ghost = None;
        self.hold = None;
        self.can_hold = true;
        self.next.clear();
        self.clearing.clear();
        self.score = 0;
        self.level = 0;
        self.lines = 0;
        self.lines_to_next_level = 0;
        self.phase = Phase::Spawning;
        self.timers = TimersSnapshot::default();
    }

    /// Resize the board buffer, reusing the allocation when it already fits.
    pub fn resize(&mut self, width: u8, height: u8) {
        self.width = width;
        self.height = height;
        self.board
            .resize(usize::from(width) * usize::from(height), None);
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.board[row * usize::from(self.width) + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.board.chunks(usize::from(self.width).max(1))
    }

    /// Record cleared rows given as board indices.
    pub(crate) fn set_clearing(&mut self, rows: &ClearedRows, buffer_rows: u8) {
        self.clearing.clear();
        for &row in rows {
            let visible = row as i16 - i16::from(buffer_rows);
            if visible >= 0 {
                self.clearing.push(visible as i8);
            }
        }
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            board: Vec::new(),
            active: None,
            ghost: None,
            ghost_alpha: 0.0,
            hold: None,
            can_hold: true,
            next: ArrayVec::new(),
            clearing: ArrayVec::new(),
            score: 0,
            level: 0,
            lines: 0,
            lines_to_next_level: 0,
            phase: Phase::Spawning,
            timers: TimersSnapshot::default(),
        }
    }
}
