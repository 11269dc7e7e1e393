//! Starfall Blocks (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so the binary, integration
//! tests and benches can use `starfall::{core, input, term, types}`.

pub use starfall_core as core;
pub use starfall_input as input;
pub use starfall_term as term;
pub use starfall_types as types;
