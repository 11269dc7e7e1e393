//! Scoring module - line points, drop points, level progression and bonus rules
//!
//! Base scoring is table driven: `LINE_CLEAR[rows]`, optionally multiplied by
//! `level + 1` using the level *before* the clear. Soft and hard drops add a
//! per-cell amount when the piece locks.
//!
//! With the `modern_scoring` capability the session also consults a
//! [`BonusRule`] at every lock. [`NoBonus`] keeps base scoring untouched;
//! [`GuidelineBonus`] implements the familiar modern extras:
//! - T-Spin scoring uses the T-Spin tables (it does not add line-clear points).
//! - B2B applies a 3/2 multiplier to the clear points (before combo bonus).
//! - Combo bonus is `50 * combo_index` with no level multiplier.

use std::fmt::Debug;

use crate::board::Board;
use crate::config::ScoringSettings;
use crate::pieces::Piece;
use crate::types::{PieceKind, Rotation, TSpinKind};

const B2B_NUMERATOR: u32 = 3;
const B2B_DENOMINATOR: u32 = 2;
const COMBO_BASE: u32 = 50;

/// Score, lines and level for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreState {
    score: u32,
    lines: u32,
    level: u32,
    /// Lines cleared since the last level-up.
    lines_in_level: u32,
}

impl ScoreState {
    pub fn new(start_level: u32) -> Self {
        Self {
            score: 0,
            lines: 0,
            level: start_level,
            lines_in_level: 0,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Lines still needed for the next level.
    pub fn lines_to_next_level(&self, lines_per_level: u32) -> u32 {
        lines_per_level.saturating_sub(self.lines_in_level)
    }

    pub fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Count cleared rows toward the next level. Returns how many levels were
    /// gained; the level never passes `max_level`.
    pub fn add_lines(&mut self, rows: u32, lines_per_level: u32, max_level: u32) -> u32 {
        self.lines = self.lines.saturating_add(rows);
        self.lines_in_level = self.lines_in_level.saturating_add(rows);

        let mut gained = 0;
        while lines_per_level > 0 && self.lines_in_level >= lines_per_level {
            self.lines_in_level -= lines_per_level;
            if self.level < max_level {
                self.level += 1;
                gained += 1;
            }
        }
        gained
    }
}

/// Base points for clearing `rows` at `level`. Zero rows score nothing.
///
/// # Panics
///
/// If `rows` is above 4.
pub fn line_points(scoring: &ScoringSettings, rows: usize, level: u32) -> u32 {
    if rows == 0 {
        return 0;
    }
    let base = scoring.line_clear.points(rows);
    if scoring.level_multiplier {
        base.saturating_mul(level.saturating_add(1))
    } else {
        base
    }
}

/// Points for the cells a piece travelled by soft and hard drop.
pub fn drop_points(scoring: &ScoringSettings, soft_cells: u32, hard_cells: u32) -> u32 {
    let movement = &scoring.movement;
    soft_cells
        .saturating_mul(movement.soft_drop_per_cell)
        .saturating_add(hard_cells.saturating_mul(movement.hard_drop_per_cell))
}

/// What a bonus rule sees when a piece locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearContext {
    /// Completed rows, 0..=4.
    pub rows: usize,
    /// Level before the clear.
    pub level: u32,
    /// Table points for this clear, multiplier applied.
    pub base_points: u32,
    pub tspin: TSpinKind,
    /// Whether `(level + 1)` scales clear points.
    pub level_multiplier: bool,
}

impl ClearContext {
    fn scaled(&self, points: u32) -> u32 {
        if self.level_multiplier {
            points.saturating_mul(self.level.saturating_add(1))
        } else {
            points
        }
    }
}

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Points for the clear itself (replaces the base points).
    pub line_clear_score: u32,
    /// Added on top of `line_clear_score`.
    pub combo_bonus: u32,
    pub b2b_applied: bool,
}

impl ScoreResult {
    pub fn total(&self) -> u32 {
        self.line_clear_score.saturating_add(self.combo_bonus)
    }
}

/// Extra scoring conditions for `modern_scoring`.
///
/// Called once per lock, including locks that clear nothing, so a rule can
/// track chains across pieces.
pub trait BonusRule: Debug + Send {
    fn evaluate(&mut self, ctx: &ClearContext) -> ScoreResult;

    /// A new game started.
    fn reset(&mut self) {}
}

/// Base scoring only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonus;

impl BonusRule for NoBonus {
    fn evaluate(&mut self, ctx: &ClearContext) -> ScoreResult {
        ScoreResult {
            line_clear_score: ctx.base_points,
            ..ScoreResult::default()
        }
    }
}

/// T-Spin tables, back-to-back and combo bonuses.
#[derive(Debug, Clone, Copy)]
pub struct GuidelineBonus {
    back_to_back: bool,
    /// `-1`: no chain, `0`: first clear in a chain, `1+`: bonus applies.
    combo: i32,
}

impl Default for GuidelineBonus {
    fn default() -> Self {
        Self {
            back_to_back: false,
            combo: -1,
        }
    }
}

impl GuidelineBonus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn back_to_back(&self) -> bool {
        self.back_to_back
    }

    pub fn combo(&self) -> i32 {
        self.combo
    }
}

impl BonusRule for GuidelineBonus {
    fn evaluate(&mut self, ctx: &ClearContext) -> ScoreResult {
        let line_clear_score = match ctx.tspin {
            TSpinKind::None => ctx.base_points,
            tspin => ctx.scaled(tspin_points(tspin, ctx.rows)),
        };

        if ctx.rows == 0 {
            // Back-to-back survives a lock that clears nothing; a combo does not.
            self.combo = -1;
            return ScoreResult {
                line_clear_score,
                ..ScoreResult::default()
            };
        }

        let qualifies = qualifies_for_b2b(ctx.tspin, ctx.rows);
        let b2b_applied = qualifies && self.back_to_back;
        self.back_to_back = qualifies;
        self.combo += 1;

        ScoreResult {
            line_clear_score: if b2b_applied {
                apply_b2b_multiplier(line_clear_score)
            } else {
                line_clear_score
            },
            combo_bonus: combo_bonus(self.combo),
            b2b_applied,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// T-Spin table points at level 0.
pub fn tspin_points(tspin: TSpinKind, rows: usize) -> u32 {
    match (tspin, rows) {
        (TSpinKind::Full, 0) => 400,
        (TSpinKind::Full, 1) => 800,
        (TSpinKind::Full, 2) => 1200,
        (TSpinKind::Full, 3) => 1600,
        (TSpinKind::Mini, 0) => 100,
        (TSpinKind::Mini, 1) => 200,
        (TSpinKind::Mini, 2) => 400,
        _ => 0,
    }
}

/// B2B applies to: T-spin full with any lines, or four lines at once.
pub fn qualifies_for_b2b(tspin: TSpinKind, rows: usize) -> bool {
    matches!((tspin, rows), (TSpinKind::Full, 1..=4) | (TSpinKind::None, 4))
}

pub fn apply_b2b_multiplier(points: u32) -> u32 {
    points.saturating_mul(B2B_NUMERATOR) / B2B_DENOMINATOR
}

pub fn combo_bonus(combo_index: i32) -> u32 {
    if combo_index <= 0 {
        return 0;
    }
    COMBO_BASE.saturating_mul(combo_index as u32)
}

/// Three-corner T-Spin check on the T piece's 3x3 box.
///
/// Only meaningful when the piece's last successful action was a rotation;
/// the caller decides that. Corners outside the board count as filled.
pub fn detect_t_spin(board: &Board, piece: &Piece) -> TSpinKind {
    if piece.kind != PieceKind::T {
        return TSpinKind::None;
    }

    const CORNERS: [(i8, i8); 4] = [(0, 0), (0, 2), (2, 0), (2, 2)];
    let filled = |(dr, dc): (i8, i8)| !board.is_free(piece.row + dr, piece.col + dc);

    let count = CORNERS.iter().filter(|&&corner| filled(corner)).count();
    if count < 3 {
        return TSpinKind::None;
    }

    // The two corners on the side the T points at.
    let front = match piece.rotation {
        Rotation::North => [(0, 0), (0, 2)],
        Rotation::East => [(0, 2), (2, 2)],
        Rotation::South => [(2, 0), (2, 2)],
        Rotation::West => [(0, 0), (2, 0)],
    };
    if front.iter().all(|&corner| filled(corner)) {
        TSpinKind::Full
    } else {
        TSpinKind::Mini
    }
}
