//! Per-run random number generation.
//!
//! Every run owns exactly one generator. Seeds are either supplied by the
//! caller (reproducible runs) or drawn from OS entropy and reported back so
//! the run can be replayed.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type RunRng = ChaCha8Rng;

/// A generator together with the seed it was built from.
pub struct SeededRng {
    pub seed: u64,
    pub rng: RunRng,
}

impl SeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rngs::OsRng.next_u64());
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Mixes a master seed with a replicate index into an independent run seed.
pub fn derive_seed(master_seed: u64, index: u64) -> u64 {
    let mut seed = master_seed;
    seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    seed ^= index.wrapping_mul(48271);
    seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    seed ^= seed >> 29;
    seed
}
