//! Uniform random draws used by the roll and the upgrade gamble.
//!
//! Every random decision in the engine goes through [`DrawSource`] so a
//! session can be driven by a seeded generator or by a fixed script.

use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};

pub trait DrawSource {
    /// Uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let scaled = (self.unit() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }

    /// Uniform draw in `[0, 100)`.
    fn percent(&mut self) -> f64 {
        self.unit() * 100.0
    }
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn unit(&mut self) -> f64 {
        (**self).unit()
    }
}

/// Adapts any `rand` generator.
#[derive(Clone, Debug)]
pub struct RngDraws<R> {
    rng: R,
}

impl<R: Rng> RngDraws<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDraws<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DrawSource for RngDraws<R> {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed sequence of unit draws, wrapping around when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedDraws {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedDraws {
    /// Values outside `[0, 1)` are clamped into range.
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        let draws: Vec<f64> = draws
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, cursor: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl DrawSource for ScriptedDraws {
    fn unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        draw
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn index__stays_in_bounds_for_draws_near_one() {
        // given
        let mut draws = ScriptedDraws::new([0.999_999_999]);

        // when
        let index = draws.index(3);

        // then
        assert_eq!(index, 2);
    }

    #[test]
    fn scripted_draws__wrap_around_when_exhausted() {
        // given
        let mut draws = ScriptedDraws::new([0.1, 0.2]);

        // when
        let taken: Vec<f64> = (0..3).map(|_| draws.unit()).collect();

        // then
        assert_eq!(taken, vec![0.1, 0.2, 0.1]);
        assert_eq!(draws.consumed(), 3);
    }

    #[test]
    fn rng_draws__stay_in_unit_interval() {
        // given
        let mut draws = RngDraws::seeded(42);

        // when
        let all_in_range = (0..10_000).all(|_| {
            let d = draws.unit();
            (0.0..1.0).contains(&d)
        });

        // then
        assert!(all_in_range);
    }
}
