use crate::error::InvalidConfig;

/// Default upper bound of generated values
pub const DEFAULT_MAX_VALUE: f64 = 1.0;
/// Default lower bound of generated values
pub const DEFAULT_MIN_VALUE: f64 = 0.0;
/// Default share of the value range used as random displacement
pub const DEFAULT_ROUGHNESS: f64 = 0.2;
/// Default grid side length (2^9 + 1)
pub const DEFAULT_SIZE: usize = 513;

/// How the displacement amplitude evolves between subdivision levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Displacement {
    /// The same amplitude is applied at every level, from the coarsest
    /// square down to single-cell spacing.
    #[default]
    Constant,
    /// The amplitude is halved after every completed level.
    Halving,
}

/// Parameters controlling a diamond-square run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Side length of the square grid, must be 2^n + 1
    pub size: usize,
    /// Largest value a cell may hold
    pub max: f64,
    /// Smallest value a cell may hold
    pub min: f64,
    /// Displacement scale relative to `max - min`
    pub roughness: f64,
    /// Amplitude schedule across subdivision levels
    pub displacement: Displacement,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::new(DEFAULT_SIZE)
    }
}

impl GeneratorConfig {
    /// Create a configuration with the default value range and roughness
    pub fn new(size: usize) -> Self {
        Self::with_range(size, DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE)
    }

    /// Create a configuration with an explicit value range and the default roughness
    pub fn with_range(size: usize, max: f64, min: f64) -> Self {
        Self::with_roughness(size, max, min, DEFAULT_ROUGHNESS)
    }

    /// Create a fully specified configuration
    ///
    /// * `size` - Grid side length, 2^n + 1
    /// * `max` - Upper bound of cell values
    /// * `min` - Lower bound of cell values
    /// * `roughness` - Share of `max - min` used as displacement amplitude
    pub fn with_roughness(size: usize, max: f64, min: f64, roughness: f64) -> Self {
        GeneratorConfig {
            size,
            max,
            min,
            roughness,
            displacement: Displacement::Constant,
        }
    }

    /// Replace the amplitude schedule
    pub fn displacement(mut self, displacement: Displacement) -> Self {
        self.displacement = displacement;
        self
    }

    /// Absolute displacement scale, `(max - min) * roughness`
    pub fn amplitude(&self) -> f64 {
        (self.max - self.min) * self.roughness
    }

    /// Base value the four corners are displaced from
    pub fn mid(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    /// Check the configuration can be subdivided down to single cells
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        for (field, value) in [("max", self.max), ("min", self.min), ("roughness", self.roughness)] {
            if !value.is_finite() {
                return Err(InvalidConfig::NonFinite { field, value });
            }
        }

        if self.size < 3 {
            return Err(InvalidConfig::SizeTooSmall(self.size));
        }
        if !(self.size - 1).is_power_of_two() {
            return Err(InvalidConfig::SizeNotPowerOfTwoPlusOne(self.size));
        }
        if self.min > self.max {
            return Err(InvalidConfig::InvertedRange {
                min: self.min,
                max: self.max,
            });
        }
        if self.roughness < 0.0 {
            return Err(InvalidConfig::NegativeRoughness(self.roughness));
        }
        // Finite bounds can still overflow once subtracted or scaled
        if !(self.max - self.min).is_finite() || !self.amplitude().is_finite() {
            return Err(InvalidConfig::RangeOverflow {
                min: self.min,
                max: self.max,
                roughness: self.roughness,
            });
        }

        Ok(())
    }
}
