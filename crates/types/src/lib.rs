//! Shared data types for Starfall Blocks.
//!
//! Everything here is plain data with no dependencies, so the core engine,
//! the input mapper and the terminal view can all speak the same vocabulary.
//!
//! # Coordinates
//!
//! The playfield is addressed as `(row, col)`:
//!
//! - **row** grows downwards; row 0 is the top of the hidden buffer region
//! - **col** grows to the right; col 0 is the left wall
//!
//! Piece shapes are expressed as `(row, col)` offsets from the piece anchor.
//!
//! # Examples
//!
//! ```
//! use starfall_types::{Action, PieceKind, Rotation, SoundEvent};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(piece, PieceKind::T);
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
//!
//! assert_eq!(Action::from_str("soft_drop"), Some(Action::SoftDrop));
//! assert_eq!(SoundEvent::LineClear.as_str(), "line_clear");
//! ```

/// The seven tetromino piece kinds.
///
/// A locked cell on the board remembers the kind that produced it; the kind
/// doubles as the color identifier resolved through the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in canonical order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// ```
    /// use starfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("Z"), Some(PieceKind::Z));
    /// assert_eq!(PieceKind::from_str("q"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }

    /// Uppercase letter used by the tuning file's palette keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }

    /// Position of this kind in [`PieceKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            PieceKind::I => 0,
            PieceKind::O => 1,
            PieceKind::T => 2,
            PieceKind::S => 3,
            PieceKind::Z => 4,
            PieceKind::J => 5,
            PieceKind::L => 6,
        }
    }
}

/// Rotation states. `North` is the spawn orientation.
///
/// The cycle clockwise is North → East → South → West → North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    pub fn rotate_cw(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Quarter turns clockwise from North (0..4).
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Inverse of [`Rotation::index`], wrapping modulo 4.
    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::North => "north",
            Rotation::East => "east",
            Rotation::South => "south",
            Rotation::West => "west",
        }
    }
}

/// Named input actions.
///
/// The core only ever sees these; which physical key produces them is decided
/// by the key bindings of the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Hold,
    Pause,
    Reset,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Left,
        Action::Right,
        Action::SoftDrop,
        Action::HardDrop,
        Action::RotateCw,
        Action::RotateCcw,
        Action::Hold,
        Action::Pause,
        Action::Reset,
    ];

    /// Parse from the snake_case names used by the tuning file's `KEYS` section.
    pub fn from_str(s: &str) -> Option<Self> {
        Action::ALL.into_iter().find(|action| action.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::SoftDrop => "soft_drop",
            Action::HardDrop => "hard_drop",
            Action::RotateCw => "rotate_cw",
            Action::RotateCcw => "rotate_ccw",
            Action::Hold => "hold",
            Action::Pause => "pause",
            Action::Reset => "reset",
        }
    }

    /// Actions whose hold duration matters (fed through the input repeater).
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Action::Left | Action::Right | Action::SoftDrop)
    }
}

/// An action-down or action-up event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub action: Action,
    pub pressed: bool,
}

impl InputEvent {
    pub fn down(action: Action) -> Self {
        Self {
            action,
            pressed: true,
        }
    }

    pub fn up(action: Action) -> Self {
        Self {
            action,
            pressed: false,
        }
    }
}

/// Discrete events for the audio subsystem. No payload beyond the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    Move,
    Rotate,
    Lock,
    LineClear,
    Tetris,
    LevelUp,
    HardDrop,
    GameOver,
}

impl SoundEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEvent::Move => "move",
            SoundEvent::Rotate => "rotate",
            SoundEvent::Lock => "lock",
            SoundEvent::LineClear => "line_clear",
            SoundEvent::Tetris => "tetris",
            SoundEvent::LevelUp => "level_up",
            SoundEvent::HardDrop => "hard_drop",
            SoundEvent::GameOver => "game_over",
        }
    }
}

/// Session phase, as exposed to the render boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// A piece was just placed; the entry delay is running.
    Spawning,
    /// The active piece is in the air (or resting before gravity noticed).
    Falling,
    /// The active piece is grounded and the lock-delay timer is running.
    Locking,
    /// Completed rows are being animated before removal.
    LineClear,
    GameOver,
    Paused,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Spawning => "spawning",
            Phase::Falling => "falling",
            Phase::Locking => "locking",
            Phase::LineClear => "line_clear",
            Phase::GameOver => "game_over",
            Phase::Paused => "paused",
        }
    }
}

/// T-Spin detection result
///
/// - **None**: Not a T-spin
/// - **Mini**: three corners filled but not both front corners
/// - **Full**: three or more corners filled including both front corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TSpinKind {
    #[default]
    None,
    Mini,
    Full,
}

/// A cell on the game board
///
/// - `None`: empty
/// - `Some(kind)`: locked, colored like `kind`
pub type Cell = Option<PieceKind>;

/// A `(row, col)` position on the playfield.
pub type Square = (i8, i8);
