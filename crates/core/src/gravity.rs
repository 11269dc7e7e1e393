//! Gravity and lock delay.
//!
//! [`DropController`] owns the per-piece timing state: the gravity frame
//! accumulator, the lock-delay timer, the `grounded` flag and how many
//! lock-delay resets the piece has spent. It never touches the board itself;
//! the session performs the moves and reports the outcome back.

use crate::config::TimingSettings;
use crate::timing::{FrameClock, Timer};

#[derive(Debug, Clone)]
pub struct DropController {
    /// Frames since the last descent, capped at the current frames-per-row.
    frames: u32,
    lock: Timer,
    grounded: bool,
    resets: u32,
    reset_budget: u32,
}

impl DropController {
    pub fn new(clock: FrameClock, timing: &TimingSettings, reset_budget: u32) -> Self {
        Self {
            frames: 0,
            lock: Timer::new(clock.units(timing.lock_delay)),
            grounded: false,
            resets: 0,
            reset_budget,
        }
    }

    /// Fresh state for a newly spawned piece.
    pub fn on_spawn(&mut self) {
        self.frames = 0;
        self.lock.stop();
        self.grounded = false;
        self.resets = 0;
    }

    /// Count one gravity frame. Returns `true` when a descent is due.
    ///
    /// The accumulator holds at `frames_per_row` until a descent succeeds, so
    /// a blocked piece retries every frame.
    pub fn gravity_frame(&mut self, frames_per_row: u32) -> bool {
        self.frames = self.frames.saturating_add(1).min(frames_per_row);
        self.frames >= frames_per_row
    }

    /// The piece moved down a row (gravity or soft drop).
    pub fn descended(&mut self) {
        self.frames = 0;
        self.lock.stop();
        self.grounded = false;
    }

    /// A downward move was blocked.
    pub fn blocked(&mut self) {
        self.grounded = true;
        if !self.lock.is_running() {
            self.lock.start();
        }
    }

    /// A lateral move or rotation succeeded. `was_grounded` is whether the
    /// piece rested on something before the move, `grounded` after it.
    ///
    /// Returns `true` if the move spent a lock-delay reset.
    pub fn shifted(&mut self, was_grounded: bool, grounded: bool) -> bool {
        let mut reset = false;
        if was_grounded && self.lock.is_running() && self.resets < self.reset_budget {
            self.lock.start();
            self.resets += 1;
            reset = true;
        }
        self.grounded = grounded;
        reset
    }

    /// Advance the lock timer one frame. Returns `true` when the piece must lock.
    ///
    /// A running timer only counts while the piece is grounded.
    pub fn lock_frame(&mut self) -> bool {
        self.grounded && self.lock.tick()
    }

    /// Lock timer running with the piece on the ground.
    pub fn is_locking(&self) -> bool {
        self.grounded && self.lock.is_running()
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Remaining lock delay in clock units.
    pub fn lock_remaining(&self) -> u64 {
        self.lock.remaining()
    }

    pub fn gravity_frames(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(lock_delay: u32, budget: u32) -> DropController {
        let timing = TimingSettings {
            lock_delay,
            ..TimingSettings::default()
        };
        DropController::new(FrameClock::new(60), &timing, budget)
    }

    #[test]
    fn gravity_fires_every_n_frames() {
        let mut drop = controller(500, 1);
        for _ in 0..2 {
            assert!(!drop.gravity_frame(3));
            assert!(!drop.gravity_frame(3));
            assert!(drop.gravity_frame(3));
            drop.descended();
        }
    }

    #[test]
    fn blocked_descent_retries_every_frame() {
        let mut drop = controller(500, 1);
        assert!(!drop.gravity_frame(2));
        assert!(drop.gravity_frame(2));
        drop.blocked();
        assert!(drop.gravity_frame(2));
        assert!(drop.gravity_frame(2));
        assert!(drop.grounded());
    }

    #[test]
    fn lock_timer_starts_once() {
        // 100ms = 6 frames.
        let mut drop = controller(100, 1);
        drop.blocked();
        for _ in 0..3 {
            assert!(!drop.lock_frame());
        }
        drop.blocked();
        assert!(!drop.lock_frame());
        assert!(!drop.lock_frame());
        assert!(drop.lock_frame(), "second block must not restart the timer");
    }

    #[test]
    fn reset_budget_is_respected() {
        let mut drop = controller(100, 1);
        drop.blocked();
        drop.lock_frame();
        assert!(drop.shifted(true, true));
        assert!(!drop.shifted(true, true));
        assert_eq!(drop.resets(), 1);
    }

    #[test]
    fn ungrounded_piece_pauses_the_timer() {
        let mut drop = controller(100, 0);
        drop.blocked();
        for _ in 0..5 {
            assert!(!drop.lock_frame());
        }
        drop.shifted(true, false);
        assert!(!drop.is_locking());
        for _ in 0..20 {
            assert!(!drop.lock_frame());
        }
        drop.shifted(false, true);
        assert!(drop.lock_frame(), "timer resumes where it paused");
    }

    #[test]
    fn descent_clears_the_timer() {
        let mut drop = controller(100, 1);
        drop.blocked();
        drop.lock_frame();
        drop.descended();
        assert!(!drop.is_locking());
        assert_eq!(drop.lock_remaining(), 0);
        assert_eq!(drop.gravity_frames(), 0);
    }
}
