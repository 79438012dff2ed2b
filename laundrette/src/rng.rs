//! Thread-local random number generation for the simulation.
//!
//! All randomness in the model flows through a thread-local `ChaCha8Rng`
//! so that a run is fully determined by the seed it was started with.
//! Each thread owns an independent stream, which is what makes the
//! configuration sweep safe to execute on a thread pool: every worker
//! re-seeds its own stream before touching a configuration.

use rand::SeedableRng;
use rand::{
    Rng,
    distributions::{Distribution, Standard, uniform::SampleUniform},
};
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local random number generator for simulation.
    static SIM_RNG: RefCell<ChaCha8Rng> = RefCell::new(ChaCha8Rng::from_entropy());

    /// The seed last installed via [`set_sim_seed`], kept for reporting.
    static CURRENT_SEED: RefCell<u64> = const { RefCell::new(0) };
}

/// Generate a random value using the thread-local simulation RNG.
///
/// The same seed always produces the same sequence of values within a
/// single thread.
///
/// # Example
///
/// ```rust
/// use laundrette::rng::{set_sim_seed, sim_random};
///
/// set_sim_seed(42);
/// let first: f64 = sim_random();
///
/// set_sim_seed(42);
/// assert_eq!(first, sim_random::<f64>());
/// ```
pub fn sim_random<T>() -> T
where
    Standard: Distribution<T>,
{
    SIM_RNG.with(|rng| rng.borrow_mut().sample(Standard))
}

/// Generate a random value within a half-open range using the
/// thread-local simulation RNG.
pub fn sim_random_range<T>(range: std::ops::Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    SIM_RNG.with(|rng| rng.borrow_mut().gen_range(range))
}

/// Generate a random value within an inclusive range using the
/// thread-local simulation RNG.
///
/// The arrival process and the program-selection scan both compare
/// against draws over `0..=100`, where the upper bound must be
/// reachable, hence the inclusive variant.
pub fn sim_random_range_inclusive<T>(range: std::ops::RangeInclusive<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    SIM_RNG.with(|rng| rng.borrow_mut().gen_range(range))
}

/// Sample an arbitrary distribution with the thread-local simulation RNG.
///
/// This is how continuous distributions (the truncated-normal pickup
/// delay) participate in the deterministic stream.
pub fn sim_sample<T, D>(distribution: D) -> T
where
    D: Distribution<T>,
{
    SIM_RNG.with(|rng| distribution.sample(&mut *rng.borrow_mut()))
}

/// Set the seed for the thread-local simulation RNG.
pub fn set_sim_seed(seed: u64) {
    SIM_RNG.with(|rng| {
        *rng.borrow_mut() = ChaCha8Rng::seed_from_u64(seed);
    });
    CURRENT_SEED.with(|current| {
        *current.borrow_mut() = seed;
    });
}

/// Get the seed last set via [`set_sim_seed`], or 0 if none was set.
///
/// Useful when reporting a failing run so it can be reproduced.
pub fn get_current_sim_seed() -> u64 {
    CURRENT_SEED.with(|current| *current.borrow())
}

/// Reset the thread-local simulation RNG to a fresh entropy-based state.
///
/// Called before seeding a new run to guarantee that no state leaks
/// between consecutive runs on the same thread.
pub fn reset_sim_rng() {
    SIM_RNG.with(|rng| {
        *rng.borrow_mut() = ChaCha8Rng::from_entropy();
    });
    CURRENT_SEED.with(|current| {
        *current.borrow_mut() = 0;
    });
}
