//! Pieces module - tetromino shapes, the active piece, and rotation
//!
//! Shapes are `(row, col)` offsets inside a 4x4 box anchored at the piece's
//! top-left corner. Rotation either rejects a colliding result outright
//! ([`RotationSystem::Simple`]) or tries the SRS wall-kick offsets
//! ([`RotationSystem::Srs`]). Reference: https://tetris.wiki/SRS

use serde::Deserialize;

use crate::board::Board;
use crate::types::{PieceKind, Rotation, Square};

/// `(row, col)` offset of a single mino relative to the piece anchor
pub type MinoOffset = (i8, i8);

/// Four mino offsets
pub type PieceShape = [MinoOffset; 4];

/// How a rotation that collides is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSystem {
    /// Reject the rotation; the piece does not change.
    #[default]
    Simple,
    /// Try the SRS kick offsets in order, accept the first that fits.
    Srs,
}

/// Shape offsets for a kind in a given rotation.
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    SHAPES[kind.index()][rotation.index()]
}

/// Absolute squares for a kind, rotation and anchor. Pure, board independent.
pub fn cells_at(kind: PieceKind, rotation: Rotation, anchor: Square) -> [Square; 4] {
    get_shape(kind, rotation).map(|(dr, dc)| (anchor.0 + dr, anchor.1 + dc))
}

// Indexed by PieceKind::index(), then Rotation::index().
const SHAPES: [[PieceShape; 4]; 7] = [
    // I
    [
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
    ],
    // O
    [
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(0, 1), (1, 0), (1, 1), (2, 1)],
    ],
    // S
    [
        [(0, 1), (0, 2), (1, 0), (1, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
    ],
    // Z
    [
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 2), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(0, 1), (1, 0), (1, 1), (2, 0)],
    ],
    // J
    [
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 0), (2, 1)],
    ],
    // L
    [
        [(0, 2), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
    ],
];

/// SRS wall kick data as `(row, col)` offsets, row growing downwards.
/// Entry 0 is the unkicked rotation.
pub type KickTable = [[(i8, i8); 5]; 8];

/// Table indexed by [`kick_index`].
pub fn get_kick_table(kind: PieceKind) -> &'static KickTable {
    match kind {
        PieceKind::O => &O_KICKS,
        PieceKind::I => &I_KICKS,
        _ => &JLSTZ_KICKS,
    }
}

const O_KICKS: KickTable = [[(0, 0); 5]; 8];

const JLSTZ_KICKS: KickTable = [
    // N->E
    [(0, 0), (0, -1), (-1, -1), (2, 0), (2, -1)],
    // N->W
    [(0, 0), (0, 1), (-1, 1), (2, 0), (2, 1)],
    // E->N
    [(0, 0), (0, 1), (1, 1), (-2, 0), (-2, 1)],
    // E->S
    [(0, 0), (0, 1), (1, 1), (-2, 0), (-2, 1)],
    // S->E
    [(0, 0), (0, -1), (-1, -1), (2, 0), (2, -1)],
    // S->W
    [(0, 0), (0, 1), (-1, 1), (2, 0), (2, 1)],
    // W->S
    [(0, 0), (0, -1), (1, -1), (-2, 0), (-2, -1)],
    // W->N
    [(0, 0), (0, -1), (1, -1), (-2, 0), (-2, -1)],
];

const I_KICKS: KickTable = [
    // N->E
    [(0, 0), (0, -2), (0, 1), (1, -2), (-2, 1)],
    // N->W
    [(0, 0), (0, -1), (0, 2), (-2, -1), (1, 2)],
    // E->N
    [(0, 0), (0, 2), (0, -1), (-1, 2), (2, -1)],
    // E->S
    [(0, 0), (0, -1), (0, 2), (-2, -1), (1, 2)],
    // S->E
    [(0, 0), (0, 1), (0, -2), (2, 1), (-1, -2)],
    // S->W
    [(0, 0), (0, 2), (0, -1), (-1, 2), (2, -1)],
    // W->S
    [(0, 0), (0, -2), (0, 1), (1, -2), (-2, 1)],
    // W->N
    [(0, 0), (0, 1), (0, -2), (2, 1), (-1, -2)],
];

/// Row of the kick table for a rotation transition.
fn kick_index(from: Rotation, clockwise: bool) -> usize {
    match (from, clockwise) {
        (Rotation::North, true) => 0,
        (Rotation::North, false) => 1,
        (Rotation::East, false) => 2,
        (Rotation::East, true) => 3,
        (Rotation::South, false) => 4,
        (Rotation::South, true) => 5,
        (Rotation::West, false) => 6,
        (Rotation::West, true) => 7,
    }
}

/// The active falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    /// Anchor row (top of the 4x4 shape box).
    pub row: i8,
    /// Anchor column (left of the 4x4 shape box).
    pub col: i8,
}

impl Piece {
    /// A piece in spawn orientation at `anchor`.
    pub fn new(kind: PieceKind, anchor: Square) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            row: anchor.0,
            col: anchor.1,
        }
    }

    pub fn anchor(&self) -> Square {
        (self.row, self.col)
    }

    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Occupied squares on the board.
    pub fn cells(&self) -> [Square; 4] {
        cells_at(self.kind, self.rotation, self.anchor())
    }

    pub fn shifted(&self, drow: i8, dcol: i8) -> Self {
        Self {
            row: self.row + drow,
            col: self.col + dcol,
            ..*self
        }
    }

    pub fn fits(&self, board: &Board) -> bool {
        board.can_place(&self.cells())
    }

    /// Resting on the floor or on locked cells.
    pub fn is_grounded(&self, board: &Board) -> bool {
        !self.shifted(1, 0).fits(board)
    }

    /// Lowest legal position straight down from here (the ghost position).
    pub fn dropped(&self, board: &Board) -> Self {
        let mut piece = *self;
        while piece.shifted(1, 0).fits(board) {
            piece = piece.shifted(1, 0);
        }
        piece
    }

    /// Attempt a quarter turn. `None` leaves the caller's piece untouched.
    ///
    /// O pieces never rotate.
    pub fn rotated(&self, board: &Board, clockwise: bool, system: RotationSystem) -> Option<Self> {
        if self.kind == PieceKind::O {
            return None;
        }

        let rotation = if clockwise {
            self.rotation.rotate_cw()
        } else {
            self.rotation.rotate_ccw()
        };
        let turned = Self { rotation, ..*self };

        match system {
            RotationSystem::Simple => turned.fits(board).then_some(turned),
            RotationSystem::Srs => {
                let kicks = &get_kick_table(self.kind)[kick_index(self.rotation, clockwise)];
                kicks
                    .iter()
                    .map(|&(dr, dc)| turned.shifted(dr, dc))
                    .find(|candidate| candidate.fits(board))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_four_distinct_cells_inside_the_box() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                let shape = get_shape(kind, Rotation::from_index(r));
                for (i, a) in shape.iter().enumerate() {
                    assert!((0..4).contains(&a.0) && (0..4).contains(&a.1));
                    for b in &shape[i + 1..] {
                        assert_ne!(a, b, "{kind:?} rotation {r} repeats a cell");
                    }
                }
            }
        }
    }

    #[test]
    fn horizontal_i_occupies_second_row_of_box() {
        let cells = cells_at(PieceKind::I, Rotation::North, (5, 3));
        assert_eq!(cells, [(6, 3), (6, 4), (6, 5), (6, 6)]);
    }

    #[test]
    fn simple_rotation_rejects_collision_without_kicking() {
        // Vertical I against the left wall: turning back to horizontal needs a kick.
        let board = Board::new(10, 20, 2);
        let piece = Piece {
            kind: PieceKind::I,
            rotation: Rotation::West,
            row: 5,
            col: -1,
        };
        assert!(piece.fits(&board));
        assert_eq!(piece.rotated(&board, true, RotationSystem::Simple), None);

        let kicked = piece
            .rotated(&board, true, RotationSystem::Srs)
            .expect("srs should kick off the wall");
        assert_eq!(kicked.rotation, Rotation::North);
        assert!(kicked.fits(&board));
    }

    #[test]
    fn o_piece_never_rotates() {
        let board = Board::new(10, 20, 2);
        let piece = Piece::new(PieceKind::O, (5, 3));
        assert_eq!(piece.rotated(&board, true, RotationSystem::Srs), None);
        assert_eq!(piece.rotated(&board, false, RotationSystem::Simple), None);
    }

    #[test]
    fn dropped_lands_on_floor() {
        let board = Board::new(10, 20, 2);
        let piece = Piece::new(PieceKind::O, (0, 3));
        let ghost = piece.dropped(&board);
        assert!(ghost.is_grounded(&board));
        assert_eq!(ghost.cells().iter().map(|c| c.0).max(), Some(21));
    }
}
