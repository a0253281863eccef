//! RNG construction for synthesis runs.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Create an RNG, seeded when a seed is given and from entropy otherwise
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
