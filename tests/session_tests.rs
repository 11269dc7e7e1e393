//! End-to-end session tests: settings in, input frames in, snapshots out.

use starfall::core::{Board, GameSnapshot, ScriptedRandomizer, Session, Settings};
use starfall::types::{Action, Phase, PieceKind, SoundEvent};

fn scripted(kinds: &[PieceKind]) -> Box<ScriptedRandomizer> {
    let tail = std::iter::repeat(PieceKind::O).take(256);
    Box::new(ScriptedRandomizer::new(kinds.iter().copied().chain(tail)))
}

fn ticks(session: &mut Session, n: usize) {
    for _ in 0..n {
        session.tick();
    }
}

fn no_entry_delay() -> Settings {
    let mut settings = Settings::default();
    settings.timing.entry_delay = 0;
    settings
}

#[test]
fn test_single_line_clear_animates_then_scores() {
    let board = Board::from_rows(10, 20, 2, &["III....III"]);
    let mut session = Session::builder(no_entry_delay())
        .board(board)
        .randomizer(scripted(&[PieceKind::I]))
        .build()
        .unwrap();

    session.press(Action::HardDrop);
    session.tick();
    assert_eq!(
        session.take_events(),
        vec![SoundEvent::HardDrop, SoundEvent::Lock, SoundEvent::LineClear]
    );
    assert_eq!(session.phase(), Phase::LineClear);
    assert!(session.active().is_none());

    let snap = session.snapshot();
    assert_eq!(snap.lines_to_next_level, 10);
    assert_eq!(snap.clearing.as_slice(), &[19]);
    assert_eq!(snap.score, 38, "line points wait for the animation");
    assert_eq!(snap.timers.line_clear_total_ms, 300);

    // 300ms = 18 frames.
    ticks(&mut session, 17);
    assert_eq!(session.phase(), Phase::LineClear);
    session.tick();
    assert_ne!(session.phase(), Phase::LineClear);

    assert_eq!(session.score(), 38 + 100);
    assert_eq!(session.lines(), 1);
    assert_eq!(session.lines_to_next_level(), 9);
    assert_eq!(session.snapshot().lines_to_next_level, 9);
    assert!(session.board().row(21).iter().all(|cell| cell.is_none()));
    assert!(session.snapshot().clearing.is_empty());
}

#[test]
fn test_held_direction_walks_to_the_wall() {
    let mut session = Session::builder(no_entry_delay())
        .randomizer(scripted(&[PieceKind::T]))
        .build()
        .unwrap();

    session.press(Action::Left);
    ticks(&mut session, 60);
    let piece = session.active().unwrap();
    assert_eq!(
        piece.cells().iter().map(|&(_, col)| col).min(),
        Some(0),
        "one second of auto shift reaches the left wall"
    );

    session.release(Action::Left);
    session.press(Action::Right);
    session.tick();
    assert_eq!(session.active().unwrap().col, piece.col + 1);
}

#[test]
fn test_presets_survive_random_play_without_overlap() {
    let actions = [
        Action::Left,
        Action::RotateCw,
        Action::Right,
        Action::RotateCcw,
        Action::Hold,
        Action::HardDrop,
    ];
    let mut snap = GameSnapshot::default();

    for name in ["classic", "modern", "beginner", "expert"] {
        let settings = Settings::preset(name).unwrap();
        let mut session = Session::builder(settings).seed(2024).build().unwrap();
        let mut locks = 0;

        for frame in 0..5000usize {
            if frame % 7 == 0 {
                let action = actions[(frame / 7) % actions.len()];
                session.press(action);
                session.release(action);
            }
            session.tick();
            locks += session
                .take_events()
                .iter()
                .filter(|&&event| event == SoundEvent::Lock)
                .count();

            session.snapshot_into(&mut snap);
            if let Some(active) = snap.active {
                for (row, col) in active.cells {
                    if row >= 0 {
                        assert!(
                            snap.cell(row as usize, col as usize).is_none(),
                            "{name}: active piece overlaps the stack on frame {frame}"
                        );
                    }
                }
            }
            if session.phase() == Phase::GameOver {
                break;
            }
        }
        assert!(locks > 0, "{name}: no piece locked");
    }
}

#[test]
fn test_game_over_then_reset_starts_fresh() {
    let mut settings = no_entry_delay();
    settings.board.rows_visible = 4;
    let mut session = Session::builder(settings)
        .randomizer(scripted(&[]))
        .build()
        .unwrap();

    for _ in 0..10 {
        if session.phase() == Phase::GameOver {
            break;
        }
        session.press(Action::HardDrop);
        session.tick();
    }
    assert_eq!(session.phase(), Phase::GameOver);
    assert!(session.take_events().contains(&SoundEvent::GameOver));

    session.press(Action::Left);
    session.tick();
    assert_eq!(session.phase(), Phase::GameOver, "input is ignored after game over");

    session.press(Action::Reset);
    session.tick();
    assert_ne!(session.phase(), Phase::GameOver);
    assert_eq!(session.score(), 0);
    assert!(session.board().cells().iter().all(|cell| cell.is_none()));
}
