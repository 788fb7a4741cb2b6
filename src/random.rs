use rand::prelude::*;

/// A source of uniform samples in `[0, 1)`
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

impl<T: UniformSource + ?Sized> UniformSource for &mut T {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Adapter drawing samples from any `rand` generator
#[derive(Debug, Clone)]
pub struct RandSource<R> {
    rng: R,
}

impl<R: RngCore> RandSource<R> {
    pub fn new(rng: R) -> Self {
        RandSource { rng }
    }
}

impl RandSource<StdRng> {
    /// Reproducible source, identical seeds give identical sample streams
    pub fn seeded(seed: u64) -> Self {
        RandSource::new(StdRng::seed_from_u64(seed))
    }
}

impl RandSource<ThreadRng> {
    /// Source backed by the thread-local entropy generator
    pub fn thread() -> Self {
        RandSource::new(thread_rng())
    }
}

impl<R: RngCore> UniformSource for RandSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed list of samples, wrapping around at the end
///
/// An empty list always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        SequenceSource {
            values: values.into(),
            position: 0,
        }
    }

    /// A source that always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far
    pub fn draws(&self) -> usize {
        self.position
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.position += 1;
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}
