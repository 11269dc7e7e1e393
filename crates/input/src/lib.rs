//! Terminal input module (engine-facing).
//!
//! Maps `crossterm` key events to [`crate::types::InputEvent`]s through
//! configurable [`KeyBindings`]. Hold timing (DAS/ARR) is not done here: the
//! core session repeats held directions on its own frame clock. For terminals
//! that never report key releases, [`ReleaseTimeout`] synthesises them.

pub mod map;
pub mod release;

pub use starfall_types as types;

pub use map::{key_code_from_name, KeyBindings, UnknownKey};
pub use release::{ReleaseTimeout, DEFAULT_RELEASE_TIMEOUT};
