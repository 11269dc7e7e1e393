//! Synthesised key-up events for terminals without release reporting.
//!
//! Most terminals only report presses (plus auto-repeat presses while a key
//! is held). [`ReleaseTimeout`] remembers when each action was last seen
//! pressed and emits an action-up once it has been quiet for the timeout. As
//! soon as a real release event arrives the terminal is known to report them
//! and the timeout switches itself off.

use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use crossterm::event::KeyEventKind;

use crate::types::{Action, InputEvent};

/// A short timeout keeps a single tap from turning into a sustained hold.
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_millis(150);

const MAX_HELD: usize = Action::ALL.len();

#[derive(Debug, Clone)]
pub struct ReleaseTimeout {
    timeout: Duration,
    held: ArrayVec<(Action, Instant), MAX_HELD>,
    releases_reported: bool,
}

impl ReleaseTimeout {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            held: ArrayVec::new(),
            releases_reported: false,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the terminal has been seen reporting real key releases.
    pub fn releases_reported(&self) -> bool {
        self.releases_reported
    }

    /// Record a key event for `action`.
    pub fn observe(&mut self, action: Action, kind: KeyEventKind, now: Instant) {
        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                match self.held.iter_mut().find(|(held, _)| *held == action) {
                    Some(entry) => entry.1 = now,
                    None => {
                        let _ = self.held.try_push((action, now));
                    }
                }
            }
            KeyEventKind::Release => {
                self.releases_reported = true;
                self.held.clear();
            }
        }
    }

    /// Action-up events for every key quiet for longer than the timeout.
    pub fn expired(&mut self, now: Instant) -> ArrayVec<InputEvent, MAX_HELD> {
        let mut released = ArrayVec::new();
        if self.releases_reported {
            return released;
        }
        let timeout = self.timeout;
        self.held.retain(|(action, seen)| {
            if now.saturating_duration_since(*seen) > timeout {
                released.push(InputEvent::up(*action));
                false
            } else {
                true
            }
        });
        released
    }
}

impl Default for ReleaseTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_TIMEOUT)
    }
}
