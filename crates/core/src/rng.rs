//! RNG module - piece sequence generation
//!
//! The session draws kinds through the [`Randomizer`] trait, so the
//! distribution is a swappable strategy:
//!
//! - [`BagRandomizer`]: the "7-bag" used by modern games. Each bag holds one
//!   of every kind, shuffled, and is drained before the next is drawn.
//! - [`UniformRandomizer`]: every draw independent and uniform.
//! - [`ScriptedRandomizer`]: a fixed, finite sequence for tests and demos.
//!
//! Bag and uniform are driven by [`SimpleRng`], a seeded LCG, so the same seed
//! always yields the same game.

use std::collections::VecDeque;
use std::fmt::Debug;

use serde::Deserialize;

use crate::types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // Low bits of a power-of-two LCG cycle quickly; draw from the high half.
        (self.next_u32() >> 16) % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// An unbounded source of piece kinds.
pub trait Randomizer: Debug + Send {
    fn next_kind(&mut self) -> PieceKind;
}

/// Which built-in strategy a configuration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomizerKind {
    #[default]
    Bag,
    Uniform,
}

impl RandomizerKind {
    pub fn build(self, seed: u32) -> Box<dyn Randomizer> {
        match self {
            RandomizerKind::Bag => Box::new(BagRandomizer::new(seed)),
            RandomizerKind::Uniform => Box::new(UniformRandomizer::new(seed)),
        }
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct BagRandomizer {
    bag: [PieceKind; 7],
    /// Index of the next undrawn piece in `bag`
    bag_index: usize,
    rng: SimpleRng,
}

impl BagRandomizer {
    pub fn new(seed: u32) -> Self {
        let mut randomizer = Self {
            bag: PieceKind::ALL,
            bag_index: 0,
            rng: SimpleRng::new(seed),
        };
        randomizer.refill_bag();
        randomizer
    }

    fn refill_bag(&mut self) {
        self.bag = PieceKind::ALL;
        self.rng.shuffle(&mut self.bag);
        self.bag_index = 0;
    }

    /// Pieces left in the current bag.
    pub fn remaining(&self) -> &[PieceKind] {
        &self.bag[self.bag_index..]
    }
}

impl Randomizer for BagRandomizer {
    fn next_kind(&mut self) -> PieceKind {
        if self.bag_index >= self.bag.len() {
            self.refill_bag();
        }
        let piece = self.bag[self.bag_index];
        self.bag_index += 1;
        piece
    }
}

/// Independent uniform draws.
#[derive(Debug, Clone)]
pub struct UniformRandomizer {
    rng: SimpleRng,
}

impl UniformRandomizer {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }
}

impl Randomizer for UniformRandomizer {
    fn next_kind(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.next_range(PieceKind::ALL.len() as u32) as usize]
    }
}

/// A finite, predetermined sequence.
///
/// Running out is a bug in the caller's setup, so it panics rather than wrap.
#[derive(Debug, Clone)]
pub struct ScriptedRandomizer {
    pieces: VecDeque<PieceKind>,
}

impl ScriptedRandomizer {
    pub fn new(pieces: impl IntoIterator<Item = PieceKind>) -> Self {
        Self {
            pieces: pieces.into_iter().collect(),
        }
    }
}

impl Randomizer for ScriptedRandomizer {
    fn next_kind(&mut self) -> PieceKind {
        match self.pieces.pop_front() {
            Some(kind) => kind,
            None => panic!("scripted piece sequence exhausted"),
        }
    }
}
