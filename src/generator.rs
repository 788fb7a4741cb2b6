use log::{debug, trace};

use crate::config::{Displacement, GeneratorConfig};
use crate::error::InvalidConfig;
use crate::grid::Grid;
use crate::random::{RandSource, UniformSource};

/// Diamond-square generator bound to a configuration
///
/// The generator holds no state between runs; every call allocates and
/// returns a fresh grid.
#[derive(Debug, Clone, Default)]
pub struct DiamondSquare {
    pub config: GeneratorConfig,
}

impl DiamondSquare {
    pub fn new(config: GeneratorConfig) -> Self {
        DiamondSquare { config }
    }

    /// Generate a grid using the thread-local random generator
    pub fn generate(&self) -> Result<Grid, InvalidConfig> {
        self.generate_with(&mut RandSource::thread())
    }

    /// Generate a grid drawing every displacement from `rng`
    pub fn generate_with<S: UniformSource + ?Sized>(&self, rng: &mut S) -> Result<Grid, InvalidConfig> {
        generate(&self.config, rng)
    }
}

/// Fill a `size x size` grid with the diamond-square algorithm
///
/// * `config` - Grid size, value range and roughness
/// * `rng` - Source of uniform samples, one sample is drawn per written cell
///
/// Returns the populated grid, every cell within `[config.min, config.max]`,
/// or the reason the configuration was rejected. No sample is drawn for a
/// rejected configuration.
pub fn generate<S: UniformSource + ?Sized>(config: &GeneratorConfig, rng: &mut S) -> Result<Grid, InvalidConfig> {
    config.validate()?;

    let size = config.size;
    let mut pass = Pass {
        grid: Grid::new(size, config.min),
        min: config.min,
        max: config.max,
        amplitude: config.amplitude(),
        rng,
    };

    pass.seed_corners(config.mid());

    let mut half = (size - 1) / 2;
    while half > 0 {
        let squares = pass.square_step(half);
        let diamonds = pass.diamond_step(half);
        debug!(
            "half={} amplitude={:.6}: {} square points, {} diamond points",
            half, pass.amplitude, squares, diamonds
        );

        if config.displacement == Displacement::Halving {
            pass.amplitude *= 0.5;
        }
        half /= 2;
    }

    Ok(pass.grid)
}

/// Working state of a single generation run
struct Pass<'a, S: ?Sized> {
    grid: Grid,
    min: f64,
    max: f64,
    amplitude: f64,
    rng: &'a mut S,
}

impl<S: UniformSource + ?Sized> Pass<'_, S> {
    /// Random offset in `(-amplitude, amplitude]`
    fn displacement(&mut self) -> f64 {
        (1.0 - 2.0 * self.rng.next_unit()) * self.amplitude
    }

    fn write(&mut self, x: usize, y: usize, base: f64) {
        let value = clamp(base + self.displacement(), self.min, self.max);
        self.grid.set(x, y, value);
    }

    /// Assign the four corners, each from its own sample
    fn seed_corners(&mut self, mid: f64) {
        let last = self.grid.size() - 1;
        for (x, y) in [(0, 0), (0, last), (last, 0), (last, last)] {
            self.write(x, y, mid);
            trace!("corner ({}, {}) = {:?}", x, y, self.grid.get(x, y));
        }
    }

    /// Set the centre of every square of side `2 * half`
    fn square_step(&mut self, half: usize) -> usize {
        let size = self.grid.size();
        let mut written = 0;
        for x in (half..size).step_by(half * 2) {
            for y in (half..size).step_by(half * 2) {
                let base = square_average(&self.grid, x, y, half);
                self.write(x, y, base);
                written += 1;
            }
        }
        written
    }

    /// Set every point of the diamond lattice at spacing `half`
    fn diamond_step(&mut self, half: usize) -> usize {
        let size = self.grid.size();
        let mut written = 0;
        for (column, x) in (0..size).step_by(half).enumerate() {
            let start = if column % 2 == 0 { half } else { 0 };
            for y in (start..size).step_by(half * 2) {
                let (base, _) = diamond_average(&self.grid, x, y, half);
                self.write(x, y, base);
                written += 1;
            }
        }
        written
    }
}

/// Restrict `value` to `[min, max]`; NaN maps to `min`
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Mean of the four diagonal neighbours of `(x, y)` at distance `half`
///
/// The caller guarantees all four are inside the grid.
pub(crate) fn square_average(grid: &Grid, x: usize, y: usize, half: usize) -> f64 {
    (grid[(x - half, y - half)]
        + grid[(x - half, y + half)]
        + grid[(x + half, y - half)]
        + grid[(x + half, y + half)])
        / 4.0
}

/// Mean and count of the axis-aligned neighbours of `(x, y)` at distance
/// `half` that lie inside the grid
pub(crate) fn diamond_average(grid: &Grid, x: usize, y: usize, half: usize) -> (f64, usize) {
    let neighbours = [
        x.checked_sub(half).map(|nx| (nx, y)),
        y.checked_sub(half).map(|ny| (x, ny)),
        Some((x, y + half)),
        Some((x + half, y)),
    ];

    let mut sum = 0.0;
    let mut count = 0;
    for (nx, ny) in neighbours.into_iter().flatten() {
        if let Some(value) = grid.get(nx, ny) {
            sum += value;
            count += 1;
        }
    }

    if count == 0 {
        return (0.0, 0);
    }
    (sum / count as f64, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceSource;

    fn assert_in_range(grid: &Grid, min: f64, max: f64) {
        for &value in grid.as_slice() {
            assert!(
                value >= min && value <= max,
                "value {} outside [{}, {}]",
                value,
                min,
                max
            );
        }
    }

    #[test]
    fn test_grid_dimensions() {
        for n in 1..=7u32 {
            let size = (1usize << n) + 1;
            let mut rng = RandSource::seeded(n as u64);
            let grid = generate(&GeneratorConfig::new(size), &mut rng).unwrap();
            assert_eq!(grid.size(), size);
            assert_eq!(grid.to_rows().len(), size);
            assert!(grid.rows().all(|row| row.len() == size));
        }
    }

    #[test]
    fn test_values_within_range() {
        let cases = [
            (0.0, 1.0, 0.2),
            (0.0, 1.0, 5.0),
            (-3.0, 2.0, 0.7),
            (10.0, 10.5, 1.0),
            (0.4, 0.4, 0.3),
        ];
        for (seed, &(min, max, roughness)) in cases.iter().enumerate() {
            let config = GeneratorConfig::with_roughness(33, max, min, roughness);
            let grid = generate(&config, &mut RandSource::seeded(seed as u64)).unwrap();
            assert_in_range(&grid, min, max);
        }
    }

    #[test]
    fn test_zero_roughness_is_flat() {
        let config = GeneratorConfig::with_roughness(5, 1.0, 0.0, 0.0);
        let grid = generate(&config, &mut RandSource::seeded(1)).unwrap();
        assert_eq!(grid.as_slice().len(), 25);
        for &value in grid.as_slice() {
            assert_eq!(value, 0.5);
        }
    }

    #[test]
    fn test_same_seed_same_grid() {
        let config = GeneratorConfig::with_roughness(65, 1.0, 0.0, 0.3);
        let a = generate(&config, &mut RandSource::seeded(1234)).unwrap();
        let b = generate(&config, &mut RandSource::seeded(1234)).unwrap();
        let bits_a: Vec<u64> = a.as_slice().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = b.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);

        let c = generate(&config, &mut RandSource::seeded(4321)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_one_sample_per_cell() {
        let size = 17;
        let mut rng = SequenceSource::constant(0.5);
        generate(&GeneratorConfig::new(size), &mut rng).unwrap();
        assert_eq!(rng.draws(), size * size);
    }

    #[test]
    fn test_corners_use_independent_samples() {
        // size 3: corners draw the first four samples
        let samples = vec![0.0, 0.25, 0.75, 0.999];
        let config = GeneratorConfig::with_roughness(3, 1.0, 0.0, 0.4);
        let mut rng = SequenceSource::new(samples.clone());
        let grid = generate(&config, &mut rng).unwrap();

        let amplitude = config.amplitude();
        let mid = config.mid();
        let expected: Vec<f64> = samples
            .iter()
            .map(|u| clamp(mid + (1.0 - 2.0 * u) * amplitude, 0.0, 1.0))
            .collect();

        assert_eq!(grid[(0, 0)], expected[0]);
        assert_eq!(grid[(0, 2)], expected[1]);
        assert_eq!(grid[(2, 0)], expected[2]);
        assert_eq!(grid[(2, 2)], expected[3]);
    }

    #[test]
    fn test_corner_values_are_clamped() {
        // mid 0.5, amplitude 2.0: u=0 gives 2.5, u=0.999 gives about -1.5
        let config = GeneratorConfig::with_roughness(3, 1.0, 0.0, 2.0);
        let mut rng = SequenceSource::new(vec![0.0, 0.999, 0.0, 0.999]);
        let grid = generate(&config, &mut rng).unwrap();
        assert_eq!(grid[(0, 0)], 1.0);
        assert_eq!(grid[(0, 2)], 0.0);
        assert_eq!(grid[(2, 0)], 1.0);
        assert_eq!(grid[(2, 2)], 0.0);
    }

    #[test]
    fn test_size_three_walkthrough() {
        // Zero displacement (u = 0.5) exposes the plain averages
        let config = GeneratorConfig::with_roughness(3, 1.0, 0.0, 0.5);
        let mut rng = SequenceSource::new(vec![0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]);
        let mut pass = Pass {
            grid: Grid::new(3, 0.0),
            min: 0.0,
            max: 1.0,
            amplitude: config.amplitude(),
            rng: &mut rng,
        };
        pass.grid.set(0, 0, 0.2);
        pass.grid.set(0, 2, 0.4);
        pass.grid.set(2, 0, 0.6);
        pass.grid.set(2, 2, 0.8);

        assert_eq!(pass.square_step(1), 1);
        assert!((pass.grid[(1, 1)] - 0.5).abs() < 1e-12);

        assert_eq!(pass.diamond_step(1), 4);
        // (0, 1): neighbours (0,0), (0,2), (1,1)
        assert!((pass.grid[(0, 1)] - (0.2 + 0.4 + 0.5) / 3.0).abs() < 1e-12);
        // (1, 0): neighbours (0,0), (1,1), (2,0)
        assert!((pass.grid[(1, 0)] - (0.2 + 0.5 + 0.6) / 3.0).abs() < 1e-12);
        // (1, 2): neighbours (0,2), (1,1), (2,2)
        assert!((pass.grid[(1, 2)] - (0.4 + 0.5 + 0.8) / 3.0).abs() < 1e-12);
        // (2, 1): neighbours (1,1), (2,0), (2,2)
        assert!((pass.grid[(2, 1)] - (0.5 + 0.6 + 0.8) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_diamond_neighbour_counts() {
        let grid = Grid::new(5, 1.0);

        // Edge points at half = 2
        assert_eq!(diamond_average(&grid, 0, 2, 2).1, 3);
        assert_eq!(diamond_average(&grid, 2, 0, 2).1, 3);
        assert_eq!(diamond_average(&grid, 2, 4, 2).1, 3);
        assert_eq!(diamond_average(&grid, 4, 2, 2).1, 3);

        // Corner
        assert_eq!(diamond_average(&grid, 0, 0, 2).1, 2);
        assert_eq!(diamond_average(&grid, 4, 4, 1).1, 2);

        // Interior points at half = 1
        assert_eq!(diamond_average(&grid, 1, 2, 1).1, 4);
        assert_eq!(diamond_average(&grid, 2, 1, 1).1, 4);
        assert_eq!(diamond_average(&grid, 2, 3, 1).1, 4);
    }

    #[test]
    fn test_diamond_average_ignores_outside_points() {
        let mut grid = Grid::new(5, 0.0);
        grid.set(0, 0, 0.3);
        grid.set(0, 4, 0.6);
        grid.set(2, 2, 0.9);
        let (mean, count) = diamond_average(&grid, 0, 2, 2);
        assert_eq!(count, 3);
        assert!((mean - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_square_average() {
        let mut grid = Grid::new(5, 0.0);
        grid.set(0, 0, 0.1);
        grid.set(0, 4, 0.2);
        grid.set(4, 0, 0.3);
        grid.set(4, 4, 0.4);
        assert!((square_average(&grid, 2, 2, 2) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_lattice_point_counts() {
        let mut rng = SequenceSource::constant(0.5);
        let mut pass = Pass {
            grid: Grid::new(5, 0.0),
            min: 0.0,
            max: 1.0,
            amplitude: 0.0,
            rng: &mut rng,
        };
        assert_eq!(pass.square_step(2), 1);
        assert_eq!(pass.diamond_step(2), 4);
        assert_eq!(pass.square_step(1), 4);
        assert_eq!(pass.diamond_step(1), 12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.3, 0.0, 1.0), 0.3);
        assert_eq!(clamp(0.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(f64::NAN, 0.25, 1.0), 0.25);
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        let mut rng = RandSource::seeded(3);
        let config = GeneratorConfig::with_roughness(5, 1e308, -1e308, 0.0);
        assert!(matches!(
            generate(&config, &mut rng),
            Err(InvalidConfig::RangeOverflow { .. })
        ));

        // Near the edge of f64 the cells still stay finite and in range
        let config = GeneratorConfig::with_roughness(17, 8e307, -8e307, 1.0);
        let grid = generate(&config, &mut rng).unwrap();
        assert_in_range(&grid, -8e307, 8e307);
    }

    #[test]
    fn test_invalid_config_draws_nothing() {
        let mut rng = SequenceSource::constant(0.5);
        let result = generate(&GeneratorConfig::new(4), &mut rng);
        assert_eq!(result, Err(InvalidConfig::SizeNotPowerOfTwoPlusOne(4)));

        let result = generate(&GeneratorConfig::with_range(5, 0.0, 1.0), &mut rng);
        assert!(matches!(result, Err(InvalidConfig::InvertedRange { .. })));

        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_halving_smooths_fine_levels() {
        // Alternate extreme samples: full-amplitude kicks at every level
        // vs kicks that shrink with the level
        let samples = vec![0.0, 0.999];
        let base = GeneratorConfig::with_roughness(65, 1.0, 0.0, 0.1);
        let constant = generate(&base, &mut SequenceSource::new(samples.clone())).unwrap();
        let halving = generate(
            &base.clone().displacement(Displacement::Halving),
            &mut SequenceSource::new(samples),
        )
        .unwrap();

        let roughness = |grid: &Grid| -> f64 {
            let size = grid.size();
            let mut total = 0.0;
            for x in 0..size {
                for y in 1..size {
                    total += (grid[(x, y)] - grid[(x, y - 1)]).abs();
                }
            }
            total
        };
        assert!(roughness(&halving) < roughness(&constant));
        assert_in_range(&halving, 0.0, 1.0);
    }

    #[test]
    fn test_diamond_square_struct() {
        let generator = DiamondSquare::new(GeneratorConfig::with_roughness(9, 2.0, -2.0, 0.5));
        let grid = generator.generate().unwrap();
        assert_eq!(grid.size(), 9);
        assert_in_range(&grid, -2.0, 2.0);

        let a = generator.generate_with(&mut RandSource::seeded(9)).unwrap();
        let b = generator.generate_with(&mut RandSource::seeded(9)).unwrap();
        assert_eq!(a, b);
    }
}
