//! Game session - the piece lifecycle state machine
//!
//! A [`Session`] owns everything about one game: board, active piece, hold
//! slot, next queue, score and all timers. It advances only through
//! [`Session::tick`], one fixed-rate frame at a time; input events pushed with
//! [`Session::push_input`] are queued and applied at the start of the next tick
//! in arrival order, so identical inputs on identical frames replay
//! identically.
//!
//! ```text
//! Spawning --entry delay--> Falling <--> Locking --lock--> LineClear --anim--> Spawning
//!     \                                      \--no rows--> Spawning
//!      \--blocked spawn--> GameOver
//! ```
//!
//! `Paused` can be entered from any live phase and returns to it with every
//! timer (the gravity accumulator included) exactly where it was.
//!
//! Within a Falling/Locking tick the order is fixed: advance the lock timer
//! and lock on expiry, apply queued actions then auto-repeat shifts, then
//! gravity.

use std::collections::VecDeque;

use arrayvec::ArrayVec;
use log::{debug, info, trace};

use crate::board::{Board, ClearedRows};
use crate::config::{Capabilities, Capability, Settings};
use crate::error::ConfigError;
use crate::gravity::DropController;
use crate::pieces::Piece;
use crate::repeater::{InputRepeater, Shift};
use crate::rng::Randomizer;
use crate::scoring::{
    detect_t_spin, drop_points, line_points, BonusRule, ClearContext, GuidelineBonus, NoBonus,
    ScoreResult, ScoreState,
};
use crate::snapshot::{ActiveSnapshot, GameSnapshot, TimersSnapshot};
use crate::timing::{FrameClock, Timer};
use crate::types::{Action, InputEvent, Phase, PieceKind, SoundEvent, Square, TSpinKind};

/// Queued actions applied in a single tick.
const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Shift(Shift),
    Rotate { clockwise: bool },
    HardDrop,
    Hold,
}

/// Builds a [`Session`] from validated settings.
///
/// ```
/// use starfall_core::{Session, Settings};
/// use starfall_core::types::Phase;
///
/// let session = Session::builder(Settings::default()).seed(7).build().unwrap();
/// assert_eq!(session.phase(), Phase::Spawning);
/// assert!(session.active().is_some());
/// ```
#[derive(Debug)]
pub struct SessionBuilder {
    settings: Settings,
    seed: u32,
    randomizer: Option<Box<dyn Randomizer>>,
    bonus: Option<Box<dyn BonusRule>>,
    board: Option<Board>,
}

impl SessionBuilder {
    /// Seed for the built-in randomizers. Ignored when `DETERMINISTIC_RNG` is set.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the configured randomizer strategy.
    pub fn randomizer(mut self, randomizer: Box<dyn Randomizer>) -> Self {
        self.randomizer = Some(randomizer);
        self
    }

    /// Bonus rule consulted when `modern_scoring` is on.
    /// Defaults to [`GuidelineBonus`].
    pub fn bonus_rule(mut self, bonus: Box<dyn BonusRule>) -> Self {
        self.bonus = Some(bonus);
        self
    }

    /// Start from a pre-filled field instead of an empty one.
    pub fn board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    pub fn build(self) -> Result<Session, ConfigError> {
        let settings = self.settings;
        settings.validate()?;

        let dims = &settings.board;
        let board = match self.board {
            Some(board) => {
                if board.width() != dims.cols
                    || board.visible_rows() != dims.rows_visible
                    || board.buffer_rows() != dims.rows_buffer
                {
                    return Err(ConfigError::BoardShape {
                        cols: board.width(),
                        rows: u16::from(board.height()),
                        expected_cols: dims.cols,
                        expected_rows: dims.total_rows(),
                    });
                }
                board
            }
            None => Board::new(dims.cols, dims.rows_visible, dims.rows_buffer),
        };

        let seed = if settings.debug.deterministic_rng {
            settings.debug.rng_seed
        } else {
            self.seed
        };
        let randomizer = self
            .randomizer
            .unwrap_or_else(|| settings.features.randomizer.build(seed));
        let bonus: Box<dyn BonusRule> = match self.bonus {
            Some(bonus) => bonus,
            None if settings.features.modern_scoring => Box::new(GuidelineBonus::new()),
            None => Box::new(NoBonus),
        };

        let clock = FrameClock::new(settings.performance.target_fps);
        let (spawn_row, spawn_col) = dims.spawn_anchor();
        let timing = settings.timing;

        let mut session = Session {
            caps: settings.capabilities(),
            clock,
            spawn: (spawn_row as i8, spawn_col as i8),
            board,
            active: None,
            hold: None,
            can_hold: true,
            queue: VecDeque::with_capacity(settings.queue_len() + 1),
            randomizer,
            bonus,
            score: ScoreState::new(settings.scoring.start_level),
            repeater: InputRepeater::new(clock, &timing, dims.cols),
            drop: DropController::new(clock, &timing, settings.features.lock_delay_reset),
            phase: Phase::Spawning,
            resume: Phase::Spawning,
            entry: Timer::new(clock.units(timing.entry_delay)),
            line_clear: Timer::new(clock.units(timing.line_clear_anim)),
            level_banner: Timer::new(clock.units(timing.level_up_banner)),
            clearing: ClearedRows::new(),
            pending_score: ScoreResult::default(),
            inputs: VecDeque::new(),
            pending: ArrayVec::new(),
            events: Vec::new(),
            last_rotated: false,
            soft_cells: 0,
            hard_cells: 0,
            piece_id: 0,
            frame: 0,
            settings,
        };
        session.fill_queue();
        info!(
            "session started: {}x{} board, seed {seed}, level {}",
            session.settings.board.cols,
            session.settings.board.rows_visible,
            session.score.level()
        );
        session.spawn();
        Ok(session)
    }
}

#[derive(Debug)]
pub struct Session {
    settings: Settings,
    caps: Capabilities,
    clock: FrameClock,
    spawn: Square,
    board: Board,
    active: Option<Piece>,
    hold: Option<PieceKind>,
    can_hold: bool,
    queue: VecDeque<PieceKind>,
    randomizer: Box<dyn Randomizer>,
    bonus: Box<dyn BonusRule>,
    score: ScoreState,
    repeater: InputRepeater,
    drop: DropController,
    phase: Phase,
    /// Phase to return to when unpausing.
    resume: Phase,
    entry: Timer,
    line_clear: Timer,
    level_banner: Timer,
    /// Rows waiting for removal during `LineClear`.
    clearing: ClearedRows,
    pending_score: ScoreResult,
    inputs: VecDeque<InputEvent>,
    pending: ArrayVec<Intent, MAX_PENDING>,
    events: Vec<SoundEvent>,
    /// The active piece's last successful action was a rotation.
    last_rotated: bool,
    soft_cells: u32,
    hard_cells: u32,
    /// Increments every time a piece is placed on the field.
    piece_id: u32,
    frame: u64,
}

impl Session {
    pub fn builder(settings: Settings) -> SessionBuilder {
        SessionBuilder {
            settings,
            seed: 0,
            randomizer: None,
            bonus: None,
            board: None,
        }
    }

    /// Queue an input event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.inputs.push_back(event);
    }

    pub fn press(&mut self, action: Action) {
        self.push_input(InputEvent::down(action));
    }

    pub fn release(&mut self, action: Action) {
        self.push_input(InputEvent::up(action));
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) {
        self.frame += 1;
        self.drain_inputs();

        if matches!(self.phase, Phase::Paused | Phase::GameOver) {
            self.pending.clear();
            return;
        }

        if self.level_banner.tick() {
            self.level_banner.stop();
        }

        match self.phase {
            Phase::Spawning => {
                self.pending.clear();
                if self.entry.tick() {
                    self.entry.stop();
                    self.phase = Phase::Falling;
                    trace!("entry delay over at frame {}", self.frame);
                }
            }
            Phase::LineClear => {
                self.pending.clear();
                if self.line_clear.tick() {
                    self.finish_clear();
                }
            }
            Phase::Falling | Phase::Locking => self.step_piece(),
            Phase::Paused | Phase::GameOver => {}
        }
    }

    /// Sound events raised since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.events)
    }

    fn drain_inputs(&mut self) {
        while let Some(event) = self.inputs.pop_front() {
            if self.settings.debug.log_inputs {
                debug!("frame {}: {:?}", self.frame, event);
            } else {
                trace!("frame {}: {:?}", self.frame, event);
            }

            let action = event.action;
            if !event.pressed {
                self.repeater.release(action);
                continue;
            }

            let intent = match action {
                Action::Pause => {
                    self.toggle_pause();
                    None
                }
                Action::Reset => {
                    self.reset();
                    None
                }
                Action::Left | Action::Right | Action::SoftDrop => {
                    self.repeater.press(action).map(Intent::Shift)
                }
                Action::RotateCw => Some(Intent::Rotate { clockwise: true }),
                Action::RotateCcw => Some(Intent::Rotate { clockwise: false }),
                Action::HardDrop => self
                    .caps
                    .contains(Capability::HardDrop)
                    .then_some(Intent::HardDrop),
                Action::Hold => self.caps.contains(Capability::Hold).then_some(Intent::Hold),
            };

            if let Some(intent) = intent {
                if self.pending.try_push(intent).is_err() {
                    debug!("dropping {intent:?}: more than {MAX_PENDING} actions in one frame");
                }
            }
        }
    }

    fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Paused => {
                self.phase = self.resume;
                debug!("resumed into {}", self.phase.as_str());
            }
            Phase::GameOver => {}
            phase => {
                self.resume = phase;
                self.phase = Phase::Paused;
                debug!("paused during {}", phase.as_str());
            }
        }
    }

    /// Start over with an empty field and fresh score.
    ///
    /// The randomizer is not reseeded; the next piece continues its sequence.
    pub fn reset(&mut self) {
        self.board.clear();
        self.score = ScoreState::new(self.settings.scoring.start_level);
        self.hold = None;
        self.can_hold = true;
        self.repeater.release_all();
        self.bonus.reset();
        self.pending.clear();
        self.entry.stop();
        self.line_clear.stop();
        self.level_banner.stop();
        self.clearing.clear();
        self.pending_score = ScoreResult::default();
        self.active = None;
        self.phase = Phase::Spawning;
        self.resume = Phase::Spawning;
        info!("session reset at frame {}", self.frame);
        self.spawn();
    }

    fn fill_queue(&mut self) {
        while self.queue.len() < self.settings.queue_len() {
            self.queue.push_back(self.randomizer.next_kind());
        }
    }

    /// Take the next kind from the queue and place it.
    fn spawn(&mut self) {
        self.fill_queue();
        let Some(kind) = self.queue.pop_front() else {
            return;
        };
        self.fill_queue();
        self.can_hold = true;

        if !self.place(kind) {
            return;
        }
        self.entry.start();
        if self.entry.is_expired() {
            self.entry.stop();
            self.phase = Phase::Falling;
        } else {
            self.phase = Phase::Spawning;
        }
    }

    /// Put a fresh `kind` at the spawn anchor. A collision ends the game.
    fn place(&mut self, kind: PieceKind) -> bool {
        let piece = Piece::new(kind, self.spawn);
        self.drop.on_spawn();
        self.last_rotated = false;
        self.soft_cells = 0;
        self.hard_cells = 0;

        if !piece.fits(&self.board) {
            self.active = None;
            self.phase = Phase::GameOver;
            self.events.push(SoundEvent::GameOver);
            info!(
                "game over: {kind:?} blocked at spawn, score {} lines {}",
                self.score.score(),
                self.score.lines()
            );
            return false;
        }

        self.active = Some(piece);
        self.piece_id = self.piece_id.wrapping_add(1);
        debug!("spawned {kind:?} at {:?}", self.spawn);
        true
    }

    fn step_piece(&mut self) {
        if self.drop.lock_frame() {
            self.pending.clear();
            self.lock_active();
            return;
        }

        let piece_id = self.piece_id;
        let pending = std::mem::take(&mut self.pending);
        for intent in pending {
            self.apply(intent);
            if !self.still_falling(piece_id) {
                return;
            }
        }

        for shift in self.repeater.tick() {
            self.apply(Intent::Shift(shift));
            if !self.still_falling(piece_id) {
                return;
            }
        }

        if !self.repeater.soft_drop_held() {
            let frames_per_row = self.frames_per_row();
            if self.drop.gravity_frame(frames_per_row) {
                self.descend(false);
            }
        }

        self.phase = if self.drop.is_locking() {
            Phase::Locking
        } else {
            Phase::Falling
        };
    }

    fn still_falling(&self, piece_id: u32) -> bool {
        self.piece_id == piece_id && matches!(self.phase, Phase::Falling | Phase::Locking)
    }

    fn apply(&mut self, intent: Intent) {
        let Some(piece) = self.active else {
            return;
        };
        match intent {
            Intent::Shift(Shift::Down) => {
                self.descend(true);
            }
            Intent::Shift(shift) => {
                let dcol = if shift == Shift::Left { -1 } else { 1 };
                let moved = piece.shifted(0, dcol);
                if moved.fits(&self.board) {
                    self.commit_lateral(piece, moved);
                    self.last_rotated = false;
                    self.events.push(SoundEvent::Move);
                }
            }
            Intent::Rotate { clockwise } => {
                let system = self.settings.features.rotation_system;
                if let Some(turned) = piece.rotated(&self.board, clockwise, system) {
                    self.commit_lateral(piece, turned);
                    self.last_rotated = true;
                    self.events.push(SoundEvent::Rotate);
                }
            }
            Intent::HardDrop => {
                let landed = piece.dropped(&self.board);
                let cells = (landed.row - piece.row) as u32;
                if cells > 0 {
                    self.last_rotated = false;
                }
                self.hard_cells += cells;
                self.active = Some(landed);
                self.events.push(SoundEvent::HardDrop);
                self.lock_active();
            }
            Intent::Hold => self.hold_active(piece.kind),
        }
    }

    fn commit_lateral(&mut self, from: Piece, to: Piece) {
        let was_grounded = from.is_grounded(&self.board);
        let grounded = to.is_grounded(&self.board);
        self.active = Some(to);
        if self.drop.shifted(was_grounded, grounded) {
            trace!("lock delay reset {}", self.drop.resets());
        }
    }

    /// One row down. `soft` counts the row for soft-drop scoring.
    fn descend(&mut self, soft: bool) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let lower = piece.shifted(1, 0);
        if lower.fits(&self.board) {
            self.active = Some(lower);
            self.drop.descended();
            self.last_rotated = false;
            if soft {
                self.soft_cells += 1;
            }
            true
        } else {
            self.drop.blocked();
            false
        }
    }

    fn hold_active(&mut self, kind: PieceKind) {
        if !self.can_hold {
            return;
        }
        let swapped = match self.hold.replace(kind) {
            Some(held) => held,
            None => {
                self.fill_queue();
                let Some(next) = self.queue.pop_front() else {
                    return;
                };
                self.fill_queue();
                next
            }
        };
        debug!("hold {kind:?}, playing {swapped:?}");
        if self.place(swapped) {
            self.phase = Phase::Falling;
        }
        self.can_hold = false;
    }

    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        let modern = self.caps.contains(Capability::ModernScoring);
        let tspin = if modern && self.last_rotated {
            detect_t_spin(&self.board, &piece)
        } else {
            TSpinKind::None
        };

        self.board.lock(&piece.cells(), piece.kind);
        self.events.push(SoundEvent::Lock);

        let scoring = &self.settings.scoring;
        self.score
            .add_points(drop_points(scoring, self.soft_cells, self.hard_cells));

        let rows = self.board.cleared_rows();
        let level = self.score.level();
        let base_points = line_points(scoring, rows.len(), level);
        let result = if modern {
            self.bonus.evaluate(&ClearContext {
                rows: rows.len(),
                level,
                base_points,
                tspin,
                level_multiplier: scoring.level_multiplier,
            })
        } else {
            ScoreResult {
                line_clear_score: base_points,
                ..ScoreResult::default()
            }
        };
        debug!(
            "locked {:?} at {:?}, {} rows, t-spin {:?}",
            piece.kind,
            piece.anchor(),
            rows.len(),
            tspin
        );

        if rows.is_empty() {
            self.score.add_points(result.total());
            self.spawn();
            return;
        }

        self.events.push(if rows.len() == 4 {
            SoundEvent::Tetris
        } else {
            SoundEvent::LineClear
        });
        self.clearing = rows;
        self.pending_score = result;
        self.phase = Phase::LineClear;
        self.line_clear.start();
        if self.line_clear.is_expired() {
            self.finish_clear();
        }
    }

    fn finish_clear(&mut self) {
        self.line_clear.stop();
        self.board.remove_rows(&self.clearing);
        let rows = self.clearing.len() as u32;
        self.clearing.clear();

        self.score.add_points(self.pending_score.total());
        self.pending_score = ScoreResult::default();

        let scoring = &self.settings.scoring;
        let gained = self
            .score
            .add_lines(rows, scoring.lines_per_level, scoring.max_level);
        if gained > 0 {
            self.level_banner.start();
            self.events.push(SoundEvent::LevelUp);
            info!("level up to {}", self.score.level());
        }
        debug!(
            "cleared {rows} rows: score {} lines {}",
            self.score.score(),
            self.score.lines()
        );
        self.spawn();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn next_queue(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    pub fn score(&self) -> u32 {
        self.score.score()
    }

    pub fn level(&self) -> u32 {
        self.score.level()
    }

    pub fn lines(&self) -> u32 {
        self.score.lines()
    }

    pub fn lines_to_next_level(&self) -> u32 {
        self.score
            .lines_to_next_level(self.settings.scoring.lines_per_level)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Frames simulated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Gravity speed at the current level.
    pub fn frames_per_row(&self) -> u32 {
        self.settings
            .gravity_table
            .frames_per_row(self.score.level())
    }

    /// Lock-delay resets spent by the active piece.
    pub fn lock_resets(&self) -> u32 {
        self.drop.resets()
    }

    pub fn is_grounded(&self) -> bool {
        self.active
            .is_some_and(|piece| piece.is_grounded(&self.board))
    }

    /// Where the active piece would land.
    pub fn ghost(&self) -> Option<Piece> {
        self.active.map(|piece| piece.dropped(&self.board))
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        let buffer = self.board.buffer_rows();
        out.resize(self.board.width(), self.board.visible_rows());
        let visible = usize::from(buffer) * usize::from(self.board.width());
        out.board.copy_from_slice(&self.board.cells()[visible..]);

        let to_visible = |(row, col): Square| (row - buffer as i8, col);
        out.active = self.active.map(|piece| ActiveSnapshot {
            kind: piece.kind,
            rotation: piece.rotation,
            cells: piece.cells().map(to_visible),
        });
        out.ghost = if self.caps.contains(Capability::Ghost) {
            self.ghost().map(|ghost| ghost.cells().map(to_visible))
        } else {
            None
        };
        out.ghost_alpha = self.settings.visual.ghost_alpha;
        out.hold = self.hold;
        out.can_hold = self.can_hold && self.caps.contains(Capability::Hold);

        out.next.clear();
        if self.caps.contains(Capability::NextPreview) {
            let count = self.settings.features.next_preview_count;
            out.next.extend(self.queue.iter().copied().take(count));
        }
        out.set_clearing(&self.clearing, buffer);

        out.score = self.score.score();
        out.level = self.score.level();
        out.lines = self.score.lines();
        out.lines_to_next_level = self.lines_to_next_level();
        out.phase = self.phase;
        out.timers = TimersSnapshot {
            lock_ms: if self.drop.is_locking() {
                self.clock.to_ms(self.drop.lock_remaining())
            } else {
                0
            },
            line_clear_ms: self.clock.to_ms(self.line_clear.remaining()),
            line_clear_total_ms: self.settings.timing.line_clear_anim,
            level_up_ms: self.clock.to_ms(self.level_banner.remaining()),
        };
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut snapshot = GameSnapshot::default();
        self.snapshot_into(&mut snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GravityTable;
    use crate::pieces::RotationSystem;
    use crate::rng::ScriptedRandomizer;
    use crate::types::Rotation;

    fn scripted(kinds: &[PieceKind]) -> Box<ScriptedRandomizer> {
        let tail = std::iter::repeat(PieceKind::O).take(64);
        Box::new(ScriptedRandomizer::new(kinds.iter().copied().chain(tail)))
    }

    /// Default rules without entry delay or clear animation.
    fn quick() -> Settings {
        let mut settings = Settings::default();
        settings.timing.entry_delay = 0;
        settings.timing.line_clear_anim = 0;
        settings
    }

    fn session(settings: Settings, kinds: &[PieceKind]) -> Session {
        Session::builder(settings)
            .randomizer(scripted(kinds))
            .build()
            .unwrap()
    }

    fn ticks(session: &mut Session, n: usize) {
        for _ in 0..n {
            session.tick();
        }
    }

    #[test]
    fn first_piece_spawns_at_anchor_then_waits_entry_delay() {
        // 150ms entry delay = 9 frames at 60fps.
        let mut s = session(Settings::default(), &[PieceKind::T]);
        let piece = s.active().unwrap();
        assert_eq!(piece.anchor(), (1, 3));
        assert_eq!(piece.rotation, Rotation::North);
        assert_eq!(s.phase(), Phase::Spawning);

        ticks(&mut s, 8);
        assert_eq!(s.phase(), Phase::Spawning);
        s.tick();
        assert_eq!(s.phase(), Phase::Falling);
        assert_eq!(s.active().unwrap().anchor(), (1, 3), "no gravity during entry delay");
    }

    #[test]
    fn movement_is_discarded_during_entry_delay() {
        let mut s = session(Settings::default(), &[PieceKind::T]);
        s.press(Action::Left);
        s.release(Action::Left);
        s.press(Action::RotateCw);
        s.tick();
        assert_eq!(s.active().unwrap().anchor(), (1, 3));
        assert_eq!(s.active().unwrap().rotation, Rotation::North);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn gravity_descends_every_frames_per_row() {
        let mut s = session(quick(), &[PieceKind::T]);
        assert_eq!(s.phase(), Phase::Falling);
        ticks(&mut s, 47);
        assert_eq!(s.active().unwrap().row, 1);
        s.tick();
        assert_eq!(s.active().unwrap().row, 2);
        ticks(&mut s, 48);
        assert_eq!(s.active().unwrap().row, 3);
    }

    #[test]
    fn hard_drop_locks_immediately_and_scores_per_cell() {
        let mut s = session(quick(), &[PieceKind::T, PieceKind::I]);
        s.press(Action::HardDrop);
        s.tick();

        assert_eq!(
            s.take_events(),
            vec![SoundEvent::HardDrop, SoundEvent::Lock]
        );
        assert_eq!(s.score(), 19 * 2);
        assert_eq!(s.board().get(20, 4), Some(Some(PieceKind::T)));
        for col in 3..6 {
            assert_eq!(s.board().get(21, col), Some(Some(PieceKind::T)));
        }
        assert_eq!(s.active().unwrap().kind, PieceKind::I);
        assert_eq!(s.phase(), Phase::Falling);
    }

    #[test]
    fn hard_drop_can_be_disabled() {
        let mut settings = quick();
        settings.features.hard_drop = false;
        let mut s = session(settings, &[PieceKind::T]);
        s.press(Action::HardDrop);
        s.tick();
        assert_eq!(s.active().unwrap().row, 1);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn soft_drop_moves_one_row_per_tick_and_scores_at_lock() {
        let mut s = session(quick(), &[PieceKind::T]);
        s.press(Action::SoftDrop);
        s.tick();
        assert_eq!(s.active().unwrap().row, 2);
        ticks(&mut s, 18);
        assert_eq!(s.active().unwrap().row, 20);
        assert_eq!(s.score(), 0, "drop points are paid at lock");

        // Tick 20 is blocked and starts the 30 frame lock delay.
        s.tick();
        assert_eq!(s.phase(), Phase::Locking);
        ticks(&mut s, 29);
        assert!(!s.take_events().contains(&SoundEvent::Lock));
        s.tick();
        assert!(s.take_events().contains(&SoundEvent::Lock));
        assert_eq!(s.score(), 19);
    }

    #[test]
    fn lock_delay_reset_budget_is_spent_once() {
        // Six-row field with instant gravity: the T reaches the floor on tick 3
        // and is blocked on tick 4, starting a 30 frame lock delay.
        let mut settings = quick();
        settings.board.rows_visible = 4;
        settings.gravity_table = GravityTable::new(vec![1]).unwrap();
        settings.features.lock_delay_reset = 1;
        settings.features.rotation_system = RotationSystem::Srs;
        let mut s = session(settings, &[PieceKind::T]);

        ticks(&mut s, 4);
        assert_eq!(s.phase(), Phase::Locking);
        ticks(&mut s, 5);

        // Tick 10: the rotation kicks off the floor and restarts the timer.
        s.press(Action::RotateCw);
        s.tick();
        assert_eq!(s.active().unwrap().rotation, Rotation::East);
        assert_eq!(s.lock_resets(), 1);

        // Tick 15: a successful move while grounded no longer resets it.
        ticks(&mut s, 4);
        s.press(Action::Left);
        s.tick();
        s.release(Action::Left);
        assert_eq!(s.lock_resets(), 1);

        s.take_events();
        ticks(&mut s, 24);
        assert!(!s.take_events().contains(&SoundEvent::Lock), "tick 39");
        s.tick();
        assert!(s.take_events().contains(&SoundEvent::Lock), "tick 40");
    }

    #[test]
    fn line_clear_waits_for_animation_then_scores() {
        let mut settings = quick();
        settings.timing.line_clear_anim = 300;
        let board = Board::from_rows(10, 20, 2, &["ZZZ....ZZZ"]);
        let mut s = Session::builder(settings)
            .randomizer(scripted(&[PieceKind::I, PieceKind::T]))
            .board(board)
            .build()
            .unwrap();

        s.press(Action::HardDrop);
        s.tick();
        assert_eq!(
            s.take_events(),
            vec![SoundEvent::HardDrop, SoundEvent::Lock, SoundEvent::LineClear]
        );
        assert_eq!(s.phase(), Phase::LineClear);
        assert_eq!(s.score(), 38);
        assert!(s.active().is_none());
        assert_eq!(s.snapshot().clearing.as_slice(), &[19]);
        assert!(s.board().is_row_full(21), "rows stay until the animation ends");

        // 300ms = 18 frames.
        ticks(&mut s, 17);
        assert_eq!(s.phase(), Phase::LineClear);
        s.tick();
        assert_eq!(s.phase(), Phase::Falling);
        assert_eq!(s.score(), 38 + 100);
        assert_eq!(s.lines(), 1);
        assert!(s.board().cells().iter().all(|c| c.is_none()));
        assert_eq!(s.active().unwrap().kind, PieceKind::T);
    }

    #[test]
    fn ten_lines_raise_level_and_speed_up_gravity() {
        let rows = ["LLLLLLLLL."; 12];
        let board = Board::from_rows(10, 20, 2, &rows);
        let mut s = Session::builder(quick())
            .randomizer(scripted(&[PieceKind::I, PieceKind::I, PieceKind::I]))
            .board(board)
            .build()
            .unwrap();
        assert_eq!(s.frames_per_row(), 48);

        for _ in 0..3 {
            // Stand the I up and walk it into the right-hand well.
            s.press(Action::RotateCw);
            for _ in 0..4 {
                s.press(Action::Right);
                s.release(Action::Right);
            }
            s.press(Action::HardDrop);
            s.tick();
            assert!(s.take_events().contains(&SoundEvent::Tetris));
        }

        assert_eq!(s.lines(), 12);
        assert_eq!(s.level(), 1);
        assert_eq!(s.frames_per_row(), 43);
        assert_eq!(s.snapshot().timers.level_up_ms, 500);

        let o = s.active().unwrap();
        assert_eq!(o.kind, PieceKind::O);
        ticks(&mut s, 42);
        assert_eq!(s.active().unwrap().row, o.row);
        s.tick();
        assert_eq!(s.active().unwrap().row, o.row + 1);
    }

    #[test]
    fn blocked_spawn_is_game_over_without_scoring() {
        let mut board = Board::new(10, 20, 2);
        board.set(2, 4, Some(PieceKind::Z));
        let mut s = Session::builder(quick())
            .randomizer(scripted(&[PieceKind::T]))
            .board(board)
            .build()
            .unwrap();

        assert_eq!(s.phase(), Phase::GameOver);
        assert_eq!(s.score(), 0);
        assert!(s.active().is_none());
        assert_eq!(s.take_events(), vec![SoundEvent::GameOver]);

        // Only reset leaves game over.
        s.press(Action::Pause);
        s.tick();
        assert_eq!(s.phase(), Phase::GameOver);
    }

    #[test]
    fn pause_freezes_gravity_accumulator() {
        let mut s = session(quick(), &[PieceKind::T]);
        ticks(&mut s, 10);
        s.press(Action::Pause);
        ticks(&mut s, 100);
        assert_eq!(s.phase(), Phase::Paused);
        assert_eq!(s.active().unwrap().row, 1);

        // Unpausing runs the rest of the tick: gravity frame 11.
        s.press(Action::Pause);
        s.tick();
        assert_eq!(s.phase(), Phase::Falling);
        ticks(&mut s, 36);
        assert_eq!(s.active().unwrap().row, 1);
        s.tick();
        assert_eq!(s.active().unwrap().row, 2);
    }

    #[test]
    fn reset_clears_field_and_continues_sequence() {
        let kinds = [PieceKind::T, PieceKind::O, PieceKind::S, PieceKind::Z];
        let mut s = session(quick(), &kinds);
        s.press(Action::HardDrop);
        s.tick();
        assert!(s.score() > 0);
        assert_eq!(s.active().unwrap().kind, PieceKind::O);

        s.press(Action::Left);
        s.press(Action::Reset);
        s.tick();
        assert_eq!(s.score(), 0);
        assert_eq!(s.lines(), 0);
        assert!(s.board().cells().iter().all(|c| c.is_none()));
        assert_eq!(s.active().unwrap().kind, PieceKind::S);
        assert_eq!(s.next_queue().collect::<Vec<_>>(), vec![PieceKind::Z]);

        // The held left key was released by the reset.
        ticks(&mut s, 30);
        assert_eq!(s.active().unwrap().col, 3);
    }

    #[test]
    fn hold_once_per_piece() {
        let mut settings = quick();
        settings.features.hold = true;
        let kinds = [PieceKind::T, PieceKind::O, PieceKind::S];
        let mut s = session(settings, &kinds);

        s.press(Action::Hold);
        s.tick();
        assert_eq!(s.hold_piece(), Some(PieceKind::T));
        assert_eq!(s.active().unwrap().kind, PieceKind::O);
        assert!(!s.can_hold());

        s.press(Action::Hold);
        s.tick();
        assert_eq!(s.active().unwrap().kind, PieceKind::O);

        s.press(Action::HardDrop);
        s.tick();
        assert_eq!(s.active().unwrap().kind, PieceKind::S);
        assert!(s.can_hold());

        s.press(Action::Hold);
        s.tick();
        let swapped = s.active().unwrap();
        assert_eq!(swapped.kind, PieceKind::T);
        assert_eq!(swapped.anchor(), (1, 3));
        assert_eq!(s.hold_piece(), Some(PieceKind::S));
    }

    #[test]
    fn hold_is_ignored_when_disabled() {
        let mut s = session(quick(), &[PieceKind::T]);
        s.press(Action::Hold);
        s.tick();
        assert_eq!(s.hold_piece(), None);
        assert_eq!(s.active().unwrap().kind, PieceKind::T);
    }

    #[test]
    fn bonus_rule_only_runs_with_modern_scoring() {
        #[derive(Debug)]
        struct Flat;
        impl BonusRule for Flat {
            fn evaluate(&mut self, _ctx: &ClearContext) -> ScoreResult {
                ScoreResult {
                    line_clear_score: 1000,
                    ..ScoreResult::default()
                }
            }
        }

        for (modern, expected) in [(false, 38), (true, 1038)] {
            let mut settings = quick();
            settings.features.modern_scoring = modern;
            let mut s = Session::builder(settings)
                .randomizer(scripted(&[PieceKind::T]))
                .bonus_rule(Box::new(Flat))
                .build()
                .unwrap();
            s.press(Action::HardDrop);
            s.tick();
            assert_eq!(s.score(), expected);
        }
    }

    #[test]
    fn snapshot_reports_visible_coordinates() {
        let s = session(Settings::default(), &[PieceKind::T, PieceKind::J]);
        let snap = s.snapshot();
        assert_eq!((snap.width, snap.height), (10, 20));
        assert_eq!(snap.board.len(), 200);
        assert_eq!(snap.phase, Phase::Spawning);

        let active = snap.active.unwrap();
        assert_eq!(active.cells, [(-1, 4), (0, 3), (0, 4), (0, 5)]);
        assert_eq!(snap.ghost, Some([(18, 4), (19, 3), (19, 4), (19, 5)]));
        assert_eq!(snap.ghost_alpha, 0.25);
        assert_eq!(snap.next.as_slice(), &[PieceKind::J]);
        assert_eq!(snap.hold, None);
    }

    #[test]
    fn active_piece_never_overlaps_locked_cells() {
        let mut settings = quick();
        settings.features.hold = true;
        let mut s = Session::builder(settings).seed(99).build().unwrap();
        let script = [
            Action::Left,
            Action::RotateCw,
            Action::Right,
            Action::Hold,
            Action::SoftDrop,
            Action::RotateCcw,
            Action::HardDrop,
        ];
        for frame in 0..2000 {
            let action = script[frame % script.len()];
            if frame % 3 == 0 {
                s.press(action);
            } else {
                s.release(action);
            }
            s.tick();
            if let Some(piece) = s.active() {
                assert!(piece.fits(s.board()), "overlap at frame {frame}");
            }
            assert!(s.lock_resets() <= 1);
            if s.phase() == Phase::GameOver {
                s.press(Action::Reset);
            }
        }
    }

    #[test]
    fn deterministic_rng_overrides_seed() {
        let mut settings = Settings::default();
        settings.debug.deterministic_rng = true;
        settings.features.next_preview_count = 5;
        let a = Session::builder(settings.clone()).seed(1).build().unwrap();
        let b = Session::builder(settings).seed(2).build().unwrap();
        assert!(a.next_queue().eq(b.next_queue()));
        assert_eq!(a.active().unwrap().kind, b.active().unwrap().kind);
    }

    #[test]
    fn invalid_settings_refuse_to_build() {
        let mut settings = Settings::default();
        settings.board.cols = 3;
        let err = Session::builder(settings).build().unwrap_err();
        assert_eq!(err, ConfigError::ColsTooSmall(3));

        let err = Session::builder(Settings::default())
            .board(Board::new(8, 20, 2))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::BoardShape { .. }));
    }
}
