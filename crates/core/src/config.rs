//! Game configuration.
//!
//! [`Settings`] mirrors the tuning file's layout (`BOARD`, `TIMING`, `KEYS`,
//! `FEATURES`, `GRAVITY_TABLE`, `SCORING`, ...) so a JSON rendition of it can
//! be loaded with [`Settings::from_json_str`]. Sections the engine has no use
//! for (canvas, audio synthesis, accessibility) are ignored when present.
//!
//! Settings are handed to the session once and never change afterwards.
//! Preset play styles are plain constructors ([`Settings::classic`],
//! [`Settings::modern`], ...) rather than patches applied to shared state.
//!
//! # Example
//!
//! ```
//! use starfall_core::Settings;
//!
//! let json = r#"{
//!     "TIMING": { "DAS": 100, "ARR": 16 },
//!     "GRAVITY_TABLE": { "0": 30, "1": 20 }
//! }"#;
//! let settings = Settings::from_json_str(json).unwrap();
//! assert_eq!(settings.timing.das, 100);
//! assert_eq!(settings.gravity_table.frames_per_row(7), 20);
//! assert_eq!(settings.board.cols, 10);
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::board::{MAX_COLS, MAX_ROWS};
use crate::error::ConfigError;
use crate::pieces::{cells_at, RotationSystem};
use crate::rng::RandomizerKind;
use crate::types::{Action, PieceKind, Rotation};

/// Longest next-piece preview a session will maintain.
pub const MAX_PREVIEW: usize = 6;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    pub board: BoardSettings,
    pub timing: TimingSettings,
    pub keys: KeySettings,
    pub features: Features,
    pub gravity_table: GravityTable,
    pub scoring: ScoringSettings,
    pub colors: Palette,
    pub visual: VisualSettings,
    pub performance: PerformanceSettings,
    pub debug: DebugSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BoardSettings {
    pub cols: u8,
    pub rows_visible: u8,
    /// Hidden rows above the visible field.
    pub rows_buffer: u8,
    pub spawn_col: i8,
    /// Relative to the first visible row; negative values sit in the buffer.
    pub spawn_row: i8,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            cols: 10,
            rows_visible: 20,
            rows_buffer: 2,
            spawn_col: 3,
            spawn_row: -1,
        }
    }
}

impl BoardSettings {
    /// Spawn anchor in board coordinates (row 0 = top of the buffer).
    pub fn spawn_anchor(&self) -> (i16, i16) {
        (
            i16::from(self.rows_buffer) + i16::from(self.spawn_row),
            i16::from(self.spawn_col),
        )
    }

    pub fn total_rows(&self) -> u16 {
        u16::from(self.rows_visible) + u16::from(self.rows_buffer)
    }
}

/// Durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TimingSettings {
    /// Delayed auto shift.
    pub das: u32,
    /// Auto repeat rate; 0 shifts straight to the wall.
    pub arr: u32,
    pub lock_delay: u32,
    pub entry_delay: u32,
    pub line_clear_anim: u32,
    pub level_up_banner: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            das: 130,
            arr: 23,
            lock_delay: 500,
            entry_delay: 150,
            line_clear_anim: 300,
            level_up_banner: 500,
        }
    }
}

/// Key names per action, in the browser `KeyboardEvent.code` style.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    pub left: String,
    pub right: String,
    pub soft_drop: String,
    pub hard_drop: String,
    pub rotate_cw: String,
    pub rotate_ccw: String,
    pub hold: String,
    pub pause: String,
    pub reset: String,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            left: "ArrowLeft".into(),
            right: "ArrowRight".into(),
            soft_drop: "ArrowDown".into(),
            hard_drop: "Space".into(),
            rotate_cw: "KeyX".into(),
            rotate_ccw: "KeyZ".into(),
            hold: "KeyC".into(),
            pause: "KeyP".into(),
            reset: "KeyR".into(),
        }
    }
}

impl KeySettings {
    pub fn binding(&self, action: Action) -> &str {
        match action {
            Action::Left => &self.left,
            Action::Right => &self.right,
            Action::SoftDrop => &self.soft_drop,
            Action::HardDrop => &self.hard_drop,
            Action::RotateCw => &self.rotate_cw,
            Action::RotateCcw => &self.rotate_ccw,
            Action::Hold => &self.hold,
            Action::Pause => &self.pause,
            Action::Reset => &self.reset,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, first) in Action::ALL.iter().enumerate() {
            for second in &Action::ALL[i + 1..] {
                let key = self.binding(*first);
                if !key.is_empty() && key == self.binding(*second) {
                    return Err(ConfigError::DuplicateBinding {
                        key: key.to_string(),
                        first: first.as_str(),
                        second: second.as_str(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Rule-set toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Features {
    pub hold: bool,
    pub ghost: bool,
    pub hard_drop: bool,
    pub next_preview: bool,
    /// How many upcoming kinds the preview shows.
    pub next_preview_count: usize,
    /// Lock-delay resets allowed per piece.
    pub lock_delay_reset: u32,
    pub modern_scoring: bool,
    pub rotation_system: RotationSystem,
    pub randomizer: RandomizerKind,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            hold: false,
            ghost: true,
            hard_drop: true,
            next_preview: true,
            next_preview_count: 1,
            lock_delay_reset: 1,
            modern_scoring: false,
            rotation_system: RotationSystem::Simple,
            randomizer: RandomizerKind::Bag,
        }
    }
}

/// A single optional rule the session consults at fixed decision points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Capability {
    Hold = 1 << 0,
    Ghost = 1 << 1,
    HardDrop = 1 << 2,
    NextPreview = 1 << 3,
    ModernScoring = 1 << 4,
}

/// The set of enabled [`Capability`] flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(self, capability: Capability, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | capability as u8)
        } else {
            Self(self.0 & !(capability as u8))
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability as u8 != 0
    }
}

impl From<&Features> for Capabilities {
    fn from(features: &Features) -> Self {
        Capabilities::empty()
            .with(Capability::Hold, features.hold)
            .with(Capability::Ghost, features.ghost)
            .with(Capability::HardDrop, features.hard_drop)
            .with(Capability::NextPreview, features.next_preview)
            .with(Capability::ModernScoring, features.modern_scoring)
    }
}

/// Frames per row by level. Levels past the end reuse the last entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<u32, u32>")]
pub struct GravityTable(Vec<u32>);

impl GravityTable {
    /// Entries for levels 0, 1, 2, ... in order.
    pub fn new(frames: Vec<u32>) -> Result<Self, ConfigError> {
        if frames.is_empty() {
            return Err(ConfigError::EmptyGravityTable);
        }
        if let Some(level) = frames.iter().position(|&f| f == 0) {
            return Err(ConfigError::ZeroGravity(level as u32));
        }
        Ok(Self(frames))
    }

    pub fn frames_per_row(&self, level: u32) -> u32 {
        let last = self.0.len() - 1;
        self.0[(level as usize).min(last)]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<u32, u32>> for GravityTable {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<u32, u32>) -> Result<Self, Self::Error> {
        if map.is_empty() {
            return Err(ConfigError::EmptyGravityTable);
        }
        let mut frames = Vec::with_capacity(map.len());
        for (expected, (&level, &value)) in map.iter().enumerate() {
            if level != expected as u32 {
                return Err(ConfigError::GravityGap(expected as u32));
            }
            frames.push(value);
        }
        Self::new(frames)
    }
}

impl Default for GravityTable {
    fn default() -> Self {
        Self(vec![
            48, 43, 38, 33, 28, 23, 18, 13, 8, 6, 5, 5, 5, 4, 4, 4, 3, 3, 3, 2, 2, 2, 2, 2, 2, 2, 2,
            2, 2, 1,
        ])
    }
}

/// Base points for clearing 1, 2, 3 or 4 rows at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<u32, u32>")]
pub struct LineClearTable(pub [u32; 4]);

impl LineClearTable {
    /// # Panics
    ///
    /// If `rows` is not 1..=4; a single piece cannot complete more.
    pub fn points(&self, rows: usize) -> u32 {
        assert!(
            (1..=4).contains(&rows),
            "line clear of {rows} rows is impossible with four-cell pieces"
        );
        self.0[rows - 1]
    }
}

impl TryFrom<BTreeMap<u32, u32>> for LineClearTable {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<u32, u32>) -> Result<Self, Self::Error> {
        let mut points = [0; 4];
        for rows in 1..=4u32 {
            points[rows as usize - 1] = *map.get(&rows).ok_or(ConfigError::LineClearTable(rows))?;
        }
        if let Some(&extra) = map.keys().find(|k| !(1..=4).contains(*k)) {
            return Err(ConfigError::LineClearTable(extra));
        }
        Ok(Self(points))
    }
}

impl Default for LineClearTable {
    fn default() -> Self {
        Self([100, 300, 500, 800])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MovementScoring {
    pub soft_drop_per_cell: u32,
    pub hard_drop_per_cell: u32,
}

impl Default for MovementScoring {
    fn default() -> Self {
        Self {
            soft_drop_per_cell: 1,
            hard_drop_per_cell: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ScoringSettings {
    pub line_clear: LineClearTable,
    pub movement: MovementScoring,
    /// Multiply line points by `level + 1`.
    pub level_multiplier: bool,
    pub lines_per_level: u32,
    pub start_level: u32,
    pub max_level: u32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            line_clear: LineClearTable::default(),
            movement: MovementScoring::default(),
            level_multiplier: true,
            lines_per_level: 10,
            start_level: 0,
            max_level: 29,
        }
    }
}

/// Hex color strings (`#RRGGBB` or `#RRGGBBAA`) per piece kind plus UI colors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Palette {
    pub i: String,
    pub j: String,
    pub l: String,
    pub o: String,
    pub s: String,
    pub t: String,
    pub z: String,
    pub ghost: String,
    pub border: String,
    pub bg: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            i: "#59CBE8".into(),
            j: "#3D5AA9".into(),
            l: "#F99D1C".into(),
            o: "#F2D94E".into(),
            s: "#76C893".into(),
            t: "#B084CC".into(),
            z: "#E86A6A".into(),
            ghost: "#FFFFFF40".into(),
            border: "#323c39".into(),
            bg: "#0E0E10".into(),
        }
    }
}

impl Palette {
    pub fn of(&self, kind: PieceKind) -> &str {
        match kind {
            PieceKind::I => &self.i,
            PieceKind::J => &self.j,
            PieceKind::L => &self.l,
            PieceKind::O => &self.o,
            PieceKind::S => &self.s,
            PieceKind::T => &self.t,
            PieceKind::Z => &self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VisualSettings {
    pub ghost_alpha: f32,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self { ghost_alpha: 0.25 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PerformanceSettings {
    pub target_fps: u32,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DebugSettings {
    /// Ignore the caller's seed and use `rng_seed`.
    pub deterministic_rng: bool,
    pub rng_seed: u32,
    pub log_inputs: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            deterministic_rng: false,
            rng_seed: 0x5EED,
            log_inputs: false,
        }
    }
}

impl Settings {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// NES-like feel: slow auto shift, long lock delay, no hard drop or hold.
    pub fn classic() -> Self {
        let mut settings = Self::default();
        settings.timing.das = 160;
        settings.timing.arr = 50;
        settings.timing.lock_delay = 1000;
        settings.features.hard_drop = false;
        settings.features.hold = false;
        settings
    }

    /// Guideline feel: fast shift, hold, hard drop, bonus scoring and SRS kicks.
    pub fn modern() -> Self {
        let mut settings = Self::default();
        settings.timing.das = 100;
        settings.timing.arr = 16;
        settings.timing.lock_delay = 500;
        settings.features.hard_drop = true;
        settings.features.hold = true;
        settings.features.modern_scoring = true;
        settings.features.rotation_system = RotationSystem::Srs;
        settings
    }

    pub fn beginner() -> Self {
        let mut settings = Self::default();
        settings.timing.das = 200;
        settings.timing.arr = 40;
        settings.timing.lock_delay = 800;
        settings.scoring.start_level = 0;
        settings.scoring.lines_per_level = 15;
        settings
    }

    pub fn expert() -> Self {
        let mut settings = Self::default();
        settings.timing.das = 80;
        settings.timing.arr = 16;
        settings.timing.lock_delay = 300;
        settings.scoring.start_level = 5;
        settings.scoring.lines_per_level = 8;
        settings
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Self::default()),
            "classic" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            "beginner" => Some(Self::beginner()),
            "expert" => Some(Self::expert()),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from(&self.features)
    }

    /// Kinds kept in the next queue; never fewer than one.
    pub fn queue_len(&self) -> usize {
        self.features.next_preview_count.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let board = &self.board;
        if board.cols < 4 {
            return Err(ConfigError::ColsTooSmall(board.cols));
        }
        if board.cols > MAX_COLS || board.total_rows() > MAX_ROWS {
            return Err(ConfigError::BoardTooLarge {
                cols: board.cols,
                rows: board.total_rows(),
                max_cols: MAX_COLS,
                max_rows: MAX_ROWS,
            });
        }
        if board.rows_visible == 0 {
            return Err(ConfigError::NoVisibleRows);
        }

        // Every kind must fit inside the grid at the spawn anchor.
        let (row, col) = board.spawn_anchor();
        for kind in PieceKind::ALL {
            let inside = cells_at(kind, Rotation::North, (0, 0)).iter().all(|&(dr, dc)| {
                let r = row + i16::from(dr);
                let c = col + i16::from(dc);
                (0..board.total_rows() as i16).contains(&r)
                    && (0..i16::from(board.cols)).contains(&c)
            });
            if !inside {
                return Err(ConfigError::SpawnOutOfBounds { kind, row, col });
            }
        }

        if self.performance.target_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if self.gravity_table.is_empty() {
            return Err(ConfigError::EmptyGravityTable);
        }
        if self.scoring.lines_per_level == 0 {
            return Err(ConfigError::ZeroLinesPerLevel);
        }
        if self.scoring.start_level > self.scoring.max_level {
            return Err(ConfigError::StartLevelAboveMax {
                start: self.scoring.start_level,
                max: self.scoring.max_level,
            });
        }
        if self.features.next_preview_count > MAX_PREVIEW {
            return Err(ConfigError::PreviewTooLong {
                count: self.features.next_preview_count,
                max: MAX_PREVIEW,
            });
        }
        let alpha = self.visual.ghost_alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::GhostAlpha(alpha));
        }
        self.keys.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuning_file_and_validate() {
        let settings = Settings::default();
        assert_eq!(settings.board.cols, 10);
        assert_eq!(settings.board.spawn_anchor(), (1, 3));
        assert_eq!(settings.timing.das, 130);
        assert_eq!(settings.gravity_table.len(), 30);
        assert_eq!(settings.gravity_table.frames_per_row(0), 48);
        assert_eq!(settings.scoring.line_clear.points(4), 800);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn every_preset_validates() {
        for name in ["default", "classic", "modern", "beginner", "expert"] {
            let settings = Settings::preset(name).expect("known preset");
            assert_eq!(settings.validate(), Ok(()), "{name}");
        }
        assert!(Settings::preset("turbo").is_none());
    }

    #[test]
    fn gravity_past_table_end_repeats_last_entry() {
        let table = GravityTable::new(vec![10, 5]).unwrap();
        assert_eq!(table.frames_per_row(0), 10);
        assert_eq!(table.frames_per_row(1), 5);
        assert_eq!(table.frames_per_row(1000), 5);
    }

    #[test]
    fn gravity_table_must_start_at_level_zero() {
        let err = Settings::from_json_str(r#"{"GRAVITY_TABLE": {"1": 40}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");

        let map: BTreeMap<u32, u32> = [(0, 40), (2, 30)].into_iter().collect();
        assert_eq!(GravityTable::try_from(map), Err(ConfigError::GravityGap(1)));
        assert_eq!(GravityTable::new(vec![]), Err(ConfigError::EmptyGravityTable));
        assert_eq!(GravityTable::new(vec![3, 0]), Err(ConfigError::ZeroGravity(1)));
    }

    #[test]
    fn line_clear_table_needs_exactly_four_entries() {
        let map: BTreeMap<u32, u32> = [(1, 1), (2, 2), (3, 3)].into_iter().collect();
        assert_eq!(LineClearTable::try_from(map), Err(ConfigError::LineClearTable(4)));

        let map: BTreeMap<u32, u32> = [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]
            .into_iter()
            .collect();
        assert_eq!(LineClearTable::try_from(map), Err(ConfigError::LineClearTable(5)));
    }

    #[test]
    #[should_panic(expected = "impossible")]
    fn five_row_clear_is_a_bug() {
        LineClearTable::default().points(5);
    }

    #[test]
    fn narrow_board_is_rejected() {
        let mut settings = Settings::default();
        settings.board.cols = 3;
        assert_eq!(settings.validate(), Err(ConfigError::ColsTooSmall(3)));
    }

    #[test]
    fn spawn_outside_board_is_rejected() {
        let mut settings = Settings::default();
        settings.board.spawn_col = 8;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::SpawnOutOfBounds { .. })
        ));

        let mut settings = Settings::default();
        settings.board.spawn_row = -3;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::SpawnOutOfBounds { .. })
        ));
    }

    #[test]
    fn negative_timing_fails_to_parse() {
        let err = Settings::from_json_str(r#"{"TIMING": {"DAS": -5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_key_binding_is_rejected() {
        let mut settings = Settings::default();
        settings.keys.hold = "Space".into();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn capabilities_follow_features() {
        let caps = Settings::modern().capabilities();
        assert!(caps.contains(Capability::Hold));
        assert!(caps.contains(Capability::ModernScoring));

        let caps = Settings::classic().capabilities();
        assert!(!caps.contains(Capability::HardDrop));
        assert!(!caps.contains(Capability::Hold));
        assert!(caps.contains(Capability::Ghost));
    }
}
