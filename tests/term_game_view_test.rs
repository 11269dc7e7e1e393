use starfall::core::{Board, ScriptedRandomizer, Session, Settings};
use starfall::term::{AnchorY, GameView, Theme, Viewport};
use starfall::types::{Action, PieceKind};

fn session_with(settings: Settings, board: Option<Board>) -> Session {
    let kinds = [PieceKind::T, PieceKind::I, PieceKind::O, PieceKind::L];
    let mut builder = Session::builder(settings)
        .randomizer(Box::new(ScriptedRandomizer::new(kinds.into_iter().cycle().take(64))));
    if let Some(board) = board {
        builder = builder.board(board);
    }
    builder.build().unwrap()
}

fn all_text(fb: &starfall::term::FrameBuffer) -> String {
    (0..fb.height()).map(|y| fb.row_text(y) + "\n").collect()
}

#[test]
fn term_view_renders_border_corners() {
    let snap = session_with(Settings::default(), None).snapshot();
    let view = GameView::default().with_anchor_y(AnchorY::Top);

    // 10x20 cells at 2x1 plus the border.
    let fb = view.render(&snap, Viewport::new(22, 22));
    assert_eq!(fb.get(0, 0).unwrap().ch, '┌');
    assert_eq!(fb.get(21, 0).unwrap().ch, '┐');
    assert_eq!(fb.get(0, 21).unwrap().ch, '└');
    assert_eq!(fb.get(21, 21).unwrap().ch, '┘');
}

#[test]
fn term_view_draws_locked_stack_from_a_live_session() {
    let board = Board::from_rows(10, 20, 2, &["ZZ........"]);
    let snap = session_with(Settings::default(), Some(board)).snapshot();
    let view = GameView::default().with_anchor_y(AnchorY::Top);
    let fb = view.render(&snap, Viewport::new(22, 22));

    let bottom = 1 + 19;
    for x in 1..=4 {
        let cell = fb.get(x, bottom).unwrap();
        assert_eq!(cell.ch, '█');
        assert_eq!(cell.style.fg, view.theme().piece(PieceKind::Z));
    }
    assert_eq!(fb.get(5, bottom).unwrap().ch, '·');
    // The spawned T's ghost rests on the floor in columns 3 to 5.
    assert_eq!(fb.get(7, bottom).unwrap().ch, '░');
    assert_eq!(fb.get(9, bottom - 1).unwrap().ch, '░');
}

#[test]
fn term_view_uses_configured_palette() {
    let mut settings = Settings::default();
    settings.colors.t = "#102030".into();
    let theme = Theme::from_palette(&settings.colors);
    let mut session = session_with(settings, None);
    let view = GameView::default()
        .with_anchor_y(AnchorY::Top)
        .with_theme(theme);

    // Let the entry delay run out and drop the T into view.
    for _ in 0..120 {
        session.tick();
    }
    let fb = view.render(&session.snapshot(), Viewport::new(22, 22));
    let painted = (0..fb.height())
        .flat_map(|y| fb.row(y))
        .filter(|cell| cell.ch == '█' && cell.style.fg == starfall::term::Rgb::new(0x10, 0x20, 0x30))
        .count();
    assert_eq!(painted, 4 * 2);
}

#[test]
fn term_view_side_panel_tracks_session() {
    let mut settings = Settings::modern();
    settings.timing.entry_delay = 0;
    let mut session = session_with(settings, None);
    session.press(Action::Hold);
    session.tick();
    session.press(Action::HardDrop);
    session.tick();

    let snap = session.snapshot();
    assert_eq!(snap.hold, Some(PieceKind::T));
    let fb = GameView::default().render(&snap, Viewport::new(60, 24));
    let text = all_text(&fb);
    assert!(text.contains("SCORE"));
    assert!(text.contains(&snap.score.to_string()));
    assert!(text.contains("HOLD"));
    assert!(text.contains("NEXT"));
}
