use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Randomized admission: a chance of `n` admits roughly `n` out of 100 draws.
pub struct ChanceGate<R = StdRng> {
    rng: Mutex<R>,
}

impl ChanceGate<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> ChanceGate<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draws uniformly from 1..=100 and admits if the draw is at most `chance`.
    pub fn admit(&self, chance: u8) -> bool {
        let draw: u8 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(1..=100);
        log::debug!("Drew {draw} against chance {chance}");
        draw <= chance
    }
}
