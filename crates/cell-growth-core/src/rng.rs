use crate::config::DivisionParams;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::f64::consts::PI;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Draw division parameters the way a decoded genome might supply them:
/// any axis, a left:right ratio within [1:2, 2:1] and a small bond bias.
pub fn random_division_params<R: Rng>(rng: &mut R) -> DivisionParams {
    DivisionParams {
        angle: rng.random_range(0.0..PI),
        ratio: 2f64.powf(rng.random_range(-1.0..=1.0)),
        bond_bias: rng.random_range(-0.2..=0.2),
        reorientate: rng.random_bool(0.25),
        mirror: rng.random_bool(0.25),
        suppress_bond: false,
    }
}
