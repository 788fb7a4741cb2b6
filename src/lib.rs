//! Diamond-square fractal grid generation.
//!
//! [`generate`] fills a `(2^n + 1) x (2^n + 1)` grid with terrain-like values
//! inside a configured range. Randomness is injected through
//! [`UniformSource`], so seeded runs are reproducible.

pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod grid;
pub mod random;

pub use config::{Displacement, GeneratorConfig};
pub use error::InvalidConfig;
pub use generator::{DiamondSquare, generate};
pub use grid::Grid;
pub use random::{RandSource, SequenceSource, UniformSource};
