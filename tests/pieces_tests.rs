//! Pieces tests - shapes, spawn placement and SRS wall kicks

use starfall::core::pieces::{cells_at, get_shape};
use starfall::core::{Board, Piece, RotationSystem};
use starfall::types::{PieceKind, Rotation};

fn empty() -> Board {
    Board::new(10, 20, 2)
}

#[test]
fn test_t_piece_shapes() {
    assert_eq!(
        get_shape(PieceKind::T, Rotation::North),
        [(0, 1), (1, 0), (1, 1), (1, 2)]
    );
    assert_eq!(
        get_shape(PieceKind::T, Rotation::South),
        [(1, 0), (1, 1), (1, 2), (2, 1)]
    );
}

#[test]
fn test_o_piece_is_rotation_invariant() {
    let north = get_shape(PieceKind::O, Rotation::North);
    for rotation in [Rotation::East, Rotation::South, Rotation::West] {
        assert_eq!(get_shape(PieceKind::O, rotation), north);
    }
}

#[test]
fn test_every_kind_fits_at_default_spawn() {
    let board = empty();
    for kind in PieceKind::ALL {
        let cells = cells_at(kind, Rotation::North, (1, 3));
        assert!(board.can_place(&cells), "{kind:?} does not fit at spawn");
        assert!(cells.iter().all(|&(row, _)| row <= 2));
    }
}

#[test]
fn test_i_kicks_off_right_wall() {
    let board = empty();
    let vertical = Piece {
        kind: PieceKind::I,
        rotation: Rotation::East,
        row: 5,
        col: 7,
    };
    assert!(vertical.fits(&board));
    assert!(vertical.cells().iter().all(|&(_, col)| col == 9));

    assert_eq!(vertical.rotated(&board, false, RotationSystem::Simple), None);

    let kicked = vertical
        .rotated(&board, false, RotationSystem::Srs)
        .expect("third kick test fits");
    assert_eq!(kicked.rotation, Rotation::North);
    assert_eq!(kicked.anchor(), (5, 6));
    assert!(kicked.fits(&board));
}

#[test]
fn test_t_kicks_off_left_wall() {
    let board = empty();
    let t = Piece {
        kind: PieceKind::T,
        rotation: Rotation::East,
        row: 8,
        col: -1,
    };
    assert!(t.fits(&board));

    assert_eq!(t.rotated(&board, true, RotationSystem::Simple), None);
    let kicked = t.rotated(&board, true, RotationSystem::Srs).unwrap();
    assert_eq!(kicked.rotation, Rotation::South);
    assert_eq!(kicked.anchor(), (8, 0));
}

#[test]
fn test_ghost_is_the_dropped_position() {
    let board = Board::from_rows(10, 20, 2, &["....I.....", "....I....."]);
    let piece = Piece::new(PieceKind::T, (1, 3));
    let ghost = piece.dropped(&board);
    assert_eq!(ghost.anchor(), (18, 3));
    assert!(ghost.is_grounded(&board));
    assert!(!piece.is_grounded(&board));
}
