//! Terminal renderer for the playfield.
//!
//! Renders a [`core::GameSnapshot`] into a small framebuffer of styled
//! characters and flushes it to the terminal with diffing. There are no
//! widgets or layout engine; each board cell maps to a fixed block of
//! terminal cells (2x1 by default, to square up the glyph aspect ratio).

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use starfall_core as core;
pub use starfall_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AnchorY, GameView, Theme, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
