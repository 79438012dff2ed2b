//! The configuration sweep over the appliance grid.
//!
//! Each `(washing machines, dryers)` pair is an independent run, a pure
//! function of the pair and its derived seed, so the grid is farmed out
//! to a thread pool with no shared mutable state. Results
//! come back in input order and assemble into a [`SweepMatrix`].

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;

use rayon::prelude::*;
use tracing::instrument;

use crate::{
    config::SimulationConfig,
    error::{SimulationError, SimulationResult},
    run::RunAggregator,
};

/// Derives the seed of one configuration's run from the sweep's base seed.
///
/// Every configuration gets its own deterministic stream, so the sweep
/// is reproducible from a single top-level seed no matter how the work
/// is distributed over threads.
pub fn derive_seed(base_seed: u64, washing_machines: u16, dryers: u16) -> u64 {
    let mut hasher = DefaultHasher::new();
    base_seed.hash(&mut hasher);
    washing_machines.hash(&mut hasher);
    dryers.hash(&mut hasher);
    hasher.finish()
}

/// Result of one swept configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigResult {
    /// Number of washing machines in this configuration.
    pub washing_machines: u16,
    /// Number of dryers in this configuration.
    pub dryers: u16,
    /// Success percentage of the run, or `None` for a degenerate run
    /// without attempts.
    pub success_percent: Option<u8>,
}

/// The assembled grid of success percentages.
///
/// Rows are indexed by washing-machine count, columns by dryer count,
/// both over the inclusive ranges the sweep was configured with. The
/// matrix is assembled once and handed as-is to whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepMatrix {
    machine_counts: RangeInclusive<u16>,
    dryer_counts: RangeInclusive<u16>,
    cells: Vec<Option<u8>>,
}

impl SweepMatrix {
    fn from_results(
        machine_counts: RangeInclusive<u16>,
        dryer_counts: RangeInclusive<u16>,
        results: &[ConfigResult],
    ) -> Self {
        Self {
            machine_counts,
            dryer_counts,
            cells: results.iter().map(|r| r.success_percent).collect(),
        }
    }

    /// The washing-machine counts covered by the rows.
    pub fn machine_counts(&self) -> RangeInclusive<u16> {
        self.machine_counts.clone()
    }

    /// The dryer counts covered by the columns.
    pub fn dryer_counts(&self) -> RangeInclusive<u16> {
        self.dryer_counts.clone()
    }

    /// Number of columns per row.
    fn row_width(&self) -> usize {
        self.dryer_counts.clone().count()
    }

    /// Success percentage for one configuration.
    ///
    /// Returns `None` when the pair lies outside the grid or when the
    /// run produced no data.
    pub fn get(&self, washing_machines: u16, dryers: u16) -> Option<u8> {
        if !self.machine_counts.contains(&washing_machines)
            || !self.dryer_counts.contains(&dryers)
        {
            return None;
        }
        let row = usize::from(washing_machines - self.machine_counts.start());
        let column = usize::from(dryers - self.dryer_counts.start());
        self.cells[row * self.row_width() + column]
    }

    /// All cells in row-major order (rows by machine count).
    pub fn cells(&self) -> &[Option<u8>] {
        &self.cells
    }

    /// Iterates over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<u8>]> {
        self.cells.chunks(self.row_width())
    }
}

impl fmt::Display for SweepMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "machines\\dryers")?;
        for dryers in self.dryer_counts.clone() {
            write!(f, " {dryers:>4}")?;
        }
        writeln!(f)?;

        for (row, machines) in self.rows().zip(self.machine_counts.clone()) {
            write!(f, "{machines:>15}")?;
            for cell in row {
                match cell {
                    Some(percent) => write!(f, " {percent:>4}")?,
                    None => write!(f, "   --")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Sweeps the Cartesian product of machine counts and dryer counts.
#[derive(Debug, Clone)]
pub struct SweepDriver {
    config: SimulationConfig,
    machine_counts: RangeInclusive<u16>,
    dryer_counts: RangeInclusive<u16>,
    base_seed: u64,
}

impl SweepDriver {
    /// Creates a sweep over the default 1..=20 × 1..=20 grid.
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            machine_counts: 1..=20,
            dryer_counts: 1..=20,
            base_seed: 0,
        })
    }

    /// Restricts the sweep to a custom grid.
    pub fn with_grid(
        mut self,
        machine_counts: RangeInclusive<u16>,
        dryer_counts: RangeInclusive<u16>,
    ) -> SimulationResult<Self> {
        if machine_counts.is_empty() || dryer_counts.is_empty() {
            return Err(SimulationError::InvalidConfiguration(
                "sweep grid must not be empty".into(),
            ));
        }
        if *machine_counts.start() == 0 || *dryer_counts.start() == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "sweep grid must start at one appliance".into(),
            ));
        }
        self.machine_counts = machine_counts;
        self.dryer_counts = dryer_counts;
        Ok(self)
    }

    /// Sets the base seed the per-configuration seeds derive from.
    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    /// The swept configuration pairs, in result order.
    pub fn pairs(&self) -> Vec<(u16, u16)> {
        self.machine_counts
            .clone()
            .flat_map(|machines| self.dryer_counts.clone().map(move |dryers| (machines, dryers)))
            .collect()
    }

    /// Runs the sweep on the rayon thread pool.
    ///
    /// Configurations are mutually independent, so any number of
    /// workers may process them; each worker re-seeds its thread-local
    /// stream per configuration, and results keep input order.
    #[instrument(skip(self))]
    pub fn run(&self) -> SimulationResult<SweepMatrix> {
        let results: Vec<ConfigResult> = self
            .pairs()
            .par_iter()
            .map(|&(machines, dryers)| self.run_one(machines, dryers))
            .collect::<SimulationResult<_>>()?;
        Ok(SweepMatrix::from_results(
            self.machine_counts.clone(),
            self.dryer_counts.clone(),
            &results,
        ))
    }

    /// Runs the sweep on the current thread, one configuration at a time.
    ///
    /// Produces exactly the same matrix as [`SweepDriver::run`]; any
    /// executor that applies the per-configuration function and keeps
    /// input order is substitutable.
    pub fn run_serial(&self) -> SimulationResult<SweepMatrix> {
        let results: Vec<ConfigResult> = self
            .pairs()
            .iter()
            .map(|&(machines, dryers)| self.run_one(machines, dryers))
            .collect::<SimulationResult<_>>()?;
        Ok(SweepMatrix::from_results(
            self.machine_counts.clone(),
            self.dryer_counts.clone(),
            &results,
        ))
    }

    fn run_one(&self, washing_machines: u16, dryers: u16) -> SimulationResult<ConfigResult> {
        let aggregator = RunAggregator::new(self.config.clone())?;
        let seed = derive_seed(self.base_seed, washing_machines, dryers);
        let log = aggregator.run(washing_machines, dryers, seed)?;
        tracing::debug!(
            washing_machines,
            dryers,
            seed,
            success = ?log.success_percent(),
            "configuration swept"
        );
        Ok(ConfigResult {
            washing_machines,
            dryers,
            success_percent: log.success_percent(),
        })
    }
}
