//! # Laundrette
//!
//! A deterministic discrete-event simulation of a shared student
//! laundry room. For every `(washing machines, dryers)` configuration
//! it simulates many independent operating days (stochastic arrivals,
//! finite-capacity appliance pools with balking, and a per-student
//! wash-then-optionally-dry workflow) and aggregates the outcomes into
//! the probability that a student who shows up actually gets their
//! laundry done. A sweep over the whole configuration grid yields the
//! matrix a capacity-planning heatmap is drawn from.
//!
//! Execution is cooperative and single-threaded within a day: a logical
//! clock advances through a priority queue of wake events, and every
//! student is an async task suspended on simulated waits. Days within a
//! run are strictly sequential; configurations within a sweep run in
//! parallel on a thread pool, each with its own seeded random stream.
//!
//! ## Example
//!
//! ```rust
//! use laundrette::{RunAggregator, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     simulation_days: 10,
//!     ..SimulationConfig::default()
//! };
//! let aggregator = RunAggregator::new(config)?;
//! let log = aggregator.run(4, 3, 42)?;
//!
//! assert!(log.wash_completions <= log.wash_attempts);
//! println!("availability: {:?}%", log.success_percent());
//! # Ok::<(), laundrette::SimulationError>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Static simulation inputs and their validation.
pub mod config;
/// One simulated operating day.
pub mod day;
/// Error types and utilities for simulation operations.
pub mod error;
/// Event scheduling and processing for the simulation engine.
pub mod events;
/// Finite-capacity appliance pools.
pub mod pool;
/// Appliance program catalogs.
pub mod program;
/// Thread-local random number generation for simulation.
pub mod rng;
/// Multi-day run aggregation.
pub mod run;
/// Core simulation world and coordination logic.
pub mod sim;
/// Sleep functionality for simulation time.
pub mod sleep;
/// Students and their laundry workflow.
pub mod student;
/// The configuration sweep over the appliance grid.
pub mod sweep;
/// Stochastic primitives of the model.
pub mod variate;

// Public API exports
pub use config::{minutes, minutes_f64, SimulationConfig};
pub use day::{DayLog, DaySimulator};
pub use error::{SimulationError, SimulationResult};
pub use events::{Event, EventQueue, ScheduledEvent};
pub use pool::{AcquireFuture, ResourcePool, SlotGuard};
pub use program::{default_dry_programs, default_wash_programs, ApplianceProgram};
pub use rng::{
    get_current_sim_seed, reset_sim_rng, set_sim_seed, sim_random, sim_random_range,
    sim_random_range_inclusive, sim_sample,
};
pub use run::{RunAggregator, RunLog};
pub use sim::{SimWorld, WeakSimWorld};
pub use sleep::SleepFuture;
pub use student::{does_laundry, DryStage, Student, StudentOutcome};
pub use sweep::{derive_seed, ConfigResult, SweepDriver, SweepMatrix};
pub use variate::{percent_draw, select_program, truncated_normal};
