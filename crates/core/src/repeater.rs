//! DAS/ARR input repeater.
//!
//! Turns how long a direction has been held into discrete shift intents.
//! Everything runs on the fixed frame clock: the repeater is told about
//! key-down/key-up as the session drains its input queue and is advanced once
//! per simulated frame with [`InputRepeater::tick`].
//!
//! For a held direction the repeats are scheduled at `das`, `das + arr`,
//! `das + 2 * arr`, ... after the press, counted from the tick after the press
//! tick. Each tick emits however many scheduled repeats fell inside it, so
//! the cadence is exact with no rounding drift. An `arr` of 0 shifts all the
//! way to the wall once DAS has elapsed.
//!
//! Left and right share one channel: the most recent key-down wins. Releasing
//! the active direction while the other is still held hands control back to
//! the other one with a fresh DAS charge and no immediate intent. Soft drop is
//! its own channel repeating once per tick.

use arrayvec::ArrayVec;

use crate::config::TimingSettings;
use crate::timing::{FrameClock, UNITS_PER_FRAME};
use crate::types::Action;

/// Most intents a single tick can produce (horizontal burst plus soft drop).
pub const MAX_INTENTS_PER_TICK: usize = 64;

/// A one-cell movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Left,
    Right,
    Down,
}

pub type Intents = ArrayVec<Shift, MAX_INTENTS_PER_TICK>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    /// First repeat, in clock units after the press. At least one frame.
    das: u64,
    /// Interval between repeats; 0 means "to the wall".
    arr: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Channel {
    /// Skip advancing on the tick the key went down.
    fresh: bool,
    held_for: u64,
    /// Repeats already emitted since the press.
    emitted: u64,
}

impl Channel {
    fn charge(&mut self) {
        *self = Channel {
            fresh: true,
            held_for: 0,
            emitted: 0,
        };
    }

    /// Number of intents due this tick, at most `cap`.
    fn advance(&mut self, schedule: Schedule, cap: usize) -> usize {
        if self.fresh {
            self.fresh = false;
            return 0;
        }
        self.held_for = self.held_for.saturating_add(UNITS_PER_FRAME);
        if self.held_for < schedule.das {
            return 0;
        }
        if schedule.arr == 0 {
            self.emitted = self.emitted.saturating_add(cap as u64);
            return cap;
        }
        let due = (self.held_for - schedule.das) / schedule.arr + 1;
        let count = due.saturating_sub(self.emitted);
        self.emitted = due;
        count.min(cap as u64) as usize
    }
}

#[derive(Debug, Clone)]
pub struct InputRepeater {
    horizontal: Schedule,
    soft_drop: Schedule,
    /// Cap on horizontal intents per tick (the board width).
    burst: usize,
    left_held: bool,
    right_held: bool,
    active: Option<Shift>,
    lateral: Channel,
    down_held: bool,
    down: Channel,
}

impl InputRepeater {
    pub fn new(clock: FrameClock, timing: &TimingSettings, cols: u8) -> Self {
        Self {
            horizontal: Schedule {
                das: clock.units(timing.das).max(UNITS_PER_FRAME),
                arr: clock.units(timing.arr),
            },
            soft_drop: Schedule {
                das: UNITS_PER_FRAME,
                arr: UNITS_PER_FRAME,
            },
            burst: usize::from(cols).clamp(1, MAX_INTENTS_PER_TICK - 1),
            left_held: false,
            right_held: false,
            active: None,
            lateral: Channel::default(),
            down_held: false,
            down: Channel::default(),
        }
    }

    /// Register a key-down. Returns the immediate intent, if any.
    ///
    /// A repeated key-down for a direction that is already held is ignored.
    pub fn press(&mut self, action: Action) -> Option<Shift> {
        let shift = match action {
            Action::Left => {
                if self.left_held {
                    return None;
                }
                self.left_held = true;
                Shift::Left
            }
            Action::Right => {
                if self.right_held {
                    return None;
                }
                self.right_held = true;
                Shift::Right
            }
            Action::SoftDrop => {
                if self.down_held {
                    return None;
                }
                self.down_held = true;
                self.down.charge();
                return Some(Shift::Down);
            }
            _ => return None,
        };
        self.active = Some(shift);
        self.lateral.charge();
        Some(shift)
    }

    /// Register a key-up. Never produces an intent.
    pub fn release(&mut self, action: Action) {
        match action {
            Action::Left => {
                self.left_held = false;
                if self.active == Some(Shift::Left) {
                    self.hand_over(self.right_held, Shift::Right);
                }
            }
            Action::Right => {
                self.right_held = false;
                if self.active == Some(Shift::Right) {
                    self.hand_over(self.left_held, Shift::Left);
                }
            }
            Action::SoftDrop => {
                self.down_held = false;
                self.down = Channel::default();
            }
            _ => {}
        }
    }

    fn hand_over(&mut self, other_held: bool, other: Shift) {
        if other_held {
            self.active = Some(other);
            self.lateral.charge();
        } else {
            self.active = None;
            self.lateral = Channel::default();
        }
    }

    /// Advance one frame and collect the repeats that fell due, horizontal first.
    pub fn tick(&mut self) -> Intents {
        let mut intents = Intents::new();

        if let Some(shift) = self.active {
            let count = self.lateral.advance(self.horizontal, self.burst);
            for _ in 0..count {
                intents.push(shift);
            }
        }

        if self.down_held && self.down.advance(self.soft_drop, 1) > 0 {
            intents.push(Shift::Down);
        }

        intents
    }

    /// Forget every held key.
    pub fn release_all(&mut self) {
        self.left_held = false;
        self.right_held = false;
        self.active = None;
        self.lateral = Channel::default();
        self.down_held = false;
        self.down = Channel::default();
    }

    /// The horizontal direction currently in control.
    pub fn horizontal(&self) -> Option<Shift> {
        self.active
    }

    pub fn soft_drop_held(&self) -> bool {
        self.down_held
    }
}
