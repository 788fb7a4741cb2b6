use thiserror::Error;

/// Reasons a generator configuration is rejected before any value is drawn.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum InvalidConfig {
    #[error("grid size {0} is too small, the smallest grid is 3x3")]
    SizeTooSmall(usize),
    #[error("grid size {0} is not 2^n + 1")]
    SizeNotPowerOfTwoPlusOne(usize),
    #[error("minimum value {min} is greater than maximum value {max}")]
    InvertedRange { min: f64, max: f64 },
    #[error("roughness {0} must not be negative")]
    NegativeRoughness(f64),
    #[error("value range [{min}, {max}] with roughness {roughness} overflows")]
    RangeOverflow { min: f64, max: f64, roughness: f64 },
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}
