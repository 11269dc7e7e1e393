//! Fixed-timestep clock.
//!
//! Settings are in milliseconds but the simulation only ever advances in whole
//! frames. To keep both exact, time is measured in clock units where one frame
//! is [`UNITS_PER_FRAME`] units and one millisecond is `fps` units:
//!
//! ```text
//! frames * 1000 >= ms * fps   <=>   frames / fps >= ms / 1000
//! ```
//!
//! so a 130ms DAS at 60 FPS expires on the first frame at or past 130ms
//! (frame 8, 133.3ms) with no rounding drift across repeats.

/// Clock units per simulated frame.
pub const UNITS_PER_FRAME: u64 = 1000;

/// Converts millisecond settings into clock units for a given frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// `fps` must be non-zero (checked by settings validation).
    pub fn new(fps: u32) -> Self {
        debug_assert!(fps > 0, "frame rate must be non-zero");
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of `ms` milliseconds in clock units.
    pub fn units(&self, ms: u32) -> u64 {
        u64::from(ms) * u64::from(self.fps)
    }

    /// Clock units back to whole milliseconds (rounded down).
    pub fn to_ms(&self, units: u64) -> u32 {
        u32::try_from(units / u64::from(self.fps)).unwrap_or(u32::MAX)
    }

    /// Number of frames needed to cover `ms` milliseconds.
    pub fn frames_for(&self, ms: u32) -> u64 {
        self.units(ms).div_ceil(UNITS_PER_FRAME)
    }
}

/// A one-shot timer advanced one frame at a time.
///
/// A stopped timer ignores [`Timer::tick`]. Arithmetic saturates, so a timer
/// left running forever cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timer {
    duration: u64,
    elapsed: u64,
    running: bool,
}

impl Timer {
    pub fn new(duration: u64) -> Self {
        Self {
            duration,
            elapsed: 0,
            running: false,
        }
    }

    /// (Re)start from zero.
    pub fn start(&mut self) {
        self.elapsed = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.elapsed = 0;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one frame. Returns `true` once the timer has expired.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(UNITS_PER_FRAME);
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.running && self.elapsed >= self.duration
    }

    pub fn remaining(&self) -> u64 {
        if self.running {
            self.duration.saturating_sub(self.elapsed)
        } else {
            0
        }
    }
}
