//! Multi-day aggregation for one appliance configuration.

use std::rc::Rc;
use tracing::instrument;

use crate::{
    config::SimulationConfig,
    day::{DayLog, DaySimulator},
    error::{SimulationError, SimulationResult},
    rng::{reset_sim_rng, set_sim_seed},
};

/// Counters accumulated over every day of one configuration's run.
///
/// Each field is the sum of the matching [`DayLog`] field across the
/// run's days.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunLog {
    /// Arrival attempts at the wash stage across all days.
    pub wash_attempts: u64,
    /// Completed wash cycles across all days.
    pub wash_completions: u64,
    /// Dryer attempts across all days.
    pub dry_attempts: u64,
    /// Completed dry cycles across all days.
    pub dry_completions: u64,
}

impl RunLog {
    /// Folds one day's counters into the run totals.
    pub fn absorb(&mut self, day: &DayLog) {
        self.wash_attempts += day.wash_attempts;
        self.wash_completions += day.wash_completions;
        self.dry_attempts += day.dry_attempts;
        self.dry_completions += day.dry_completions;
    }

    /// Total attempts across both stages.
    pub fn total_attempts(&self) -> u64 {
        self.wash_attempts + self.dry_attempts
    }

    /// Total completions across both stages.
    pub fn total_completions(&self) -> u64 {
        self.wash_completions + self.dry_completions
    }

    /// Success percentage of the run, rounded to the nearest integer.
    ///
    /// Returns `None` for a run without any attempts, where the
    /// percentage is undefined; with validated inputs this cannot occur,
    /// but a degenerate run must report "no data" rather than divide by
    /// zero.
    pub fn success_percent(&self) -> Option<u8> {
        if self.total_attempts() == 0 {
            return None;
        }
        let percent =
            100.0 * self.total_completions() as f64 / self.total_attempts() as f64;
        Some(percent.round() as u8)
    }
}

/// Runs the configured number of independent days for one
/// `(washing machines, dryers)` pair and aggregates their counters.
///
/// Days run strictly sequentially on a single-threaded runtime; each
/// day gets fresh pools and a fresh clock, while the whole run shares
/// one seeded random stream.
#[derive(Debug, Clone)]
pub struct RunAggregator {
    config: SimulationConfig,
}

impl RunAggregator {
    /// Creates an aggregator after validating the configuration.
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs every day of one configuration and returns the summed log.
    ///
    /// The thread-local random stream is reset and seeded here, making
    /// the run a pure function of `(washing_machines, dryers, seed)`,
    /// which is what allows the sweep to farm runs out to worker
    /// threads.
    #[instrument(skip(self), level = "debug")]
    pub fn run(
        &self,
        washing_machines: u16,
        dryers: u16,
        seed: u64,
    ) -> SimulationResult<RunLog> {
        SimulationConfig::validate_appliance_counts(washing_machines, dryers)?;

        reset_sim_rng();
        set_sim_seed(seed);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|err| {
                SimulationError::InvalidState(format!("failed to build runtime: {err}"))
            })?;
        let local = tokio::task::LocalSet::new();

        let config = Rc::new(self.config.clone());
        let days = self.config.simulation_days;

        runtime.block_on(local.run_until(async move {
            let day = DaySimulator::new(config, washing_machines, dryers)?;
            let mut run_log = RunLog::default();
            for day_index in 0..days {
                let day_log = day.run().await?;
                run_log.absorb(&day_log);
                tracing::trace!(day = day_index + 1, ?day_log, "day folded into run");
            }
            Ok(run_log)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config(days: u32) -> SimulationConfig {
        SimulationConfig {
            simulation_days: days,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn success_percent_bounds_and_no_data() {
        let empty = RunLog::default();
        assert_eq!(empty.success_percent(), None);

        let perfect = RunLog {
            wash_attempts: 10,
            wash_completions: 10,
            dry_attempts: 4,
            dry_completions: 4,
        };
        assert_eq!(perfect.success_percent(), Some(100));

        let halved = RunLog {
            wash_attempts: 10,
            wash_completions: 5,
            dry_attempts: 0,
            dry_completions: 0,
        };
        assert_eq!(halved.success_percent(), Some(50));
    }

    #[test]
    fn absorb_sums_days() {
        let mut run = RunLog::default();
        run.absorb(&DayLog {
            wash_attempts: 3,
            wash_completions: 2,
            dry_attempts: 1,
            dry_completions: 1,
        });
        run.absorb(&DayLog {
            wash_attempts: 4,
            wash_completions: 4,
            dry_attempts: 2,
            dry_completions: 1,
        });

        assert_eq!(run.wash_attempts, 7);
        assert_eq!(run.wash_completions, 6);
        assert_eq!(run.dry_attempts, 3);
        assert_eq!(run.dry_completions, 2);
        assert_eq!(run.total_attempts(), 10);
        assert_eq!(run.total_completions(), 8);
    }

    #[test]
    fn runs_are_reproducible_per_seed() {
        let aggregator = RunAggregator::new(short_config(20)).unwrap();

        let first = aggregator.run(2, 2, 1234).unwrap();
        let second = aggregator.run(2, 2, 1234).unwrap();

        assert_eq!(first, second);
        assert!(first.wash_attempts > 0);
    }

    #[test]
    fn completions_never_exceed_attempts() {
        let aggregator = RunAggregator::new(short_config(30)).unwrap();
        let log = aggregator.run(3, 2, 9).unwrap();

        assert!(log.wash_completions <= log.wash_attempts);
        assert!(log.dry_completions <= log.dry_attempts);
        let percent = log.success_percent().unwrap();
        assert!(percent <= 100);
    }

    #[test]
    fn rejects_zero_appliances() {
        let aggregator = RunAggregator::new(short_config(1)).unwrap();
        assert!(aggregator.run(0, 1, 0).is_err());
        assert!(aggregator.run(1, 0, 0).is_err());
    }
}
