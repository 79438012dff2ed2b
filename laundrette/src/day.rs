//! One simulated operating day.
//!
//! The day owns a fresh [`SimWorld`], two fresh appliance pools, and a
//! single logical clock. The arrival generator and every admitted
//! student run as day-scoped cooperative tasks; the drive loop
//! interleaves event processing with task polling until the day drains.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{yield_now, JoinHandle};
use tracing::instrument;

use crate::{
    config::{minutes, SimulationConfig},
    error::{SimulationError, SimulationResult},
    pool::ResourcePool,
    sim::{SimWorld, WeakSimWorld},
    student::{does_laundry, Student, StudentOutcome},
    variate::percent_draw,
};

/// Iterations the drive loop tolerates without an event, a finished
/// task, or a generator transition before declaring the day stalled.
const STALL_PATIENCE: u32 = 8;

/// Outcome counters of a single operating day.
///
/// `wash_attempts` is the arrival counter: it counts every arrival
/// attempt, admitted or balked, so balked arrivals stay in the
/// success-rate denominator. Completions are recorded by the student
/// workflows. All counters reset with each new day.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DayLog {
    /// Arrival attempts at the wash stage, including balked arrivals.
    pub wash_attempts: u64,
    /// Wash cycles carried through unloading.
    pub wash_completions: u64,
    /// Students who wanted the dryer after washing.
    pub dry_attempts: u64,
    /// Dry cycles carried through unloading.
    pub dry_completions: u64,
}

/// Wall-clock rendering of simulation time for trace output, counting
/// from a 12:00 opening.
pub(crate) fn wall_clock(now: Duration) -> String {
    let total_minutes = now.as_secs() / 60;
    format!("{:02}:{:02}", 12 + total_minutes / 60, total_minutes % 60)
}

type StudentHandles = Rc<RefCell<Vec<JoinHandle<SimulationResult<StudentOutcome>>>>>;

/// Drives one simulated operating day for a fixed appliance pair.
#[derive(Debug)]
pub struct DaySimulator {
    config: Rc<SimulationConfig>,
    washing_machines: u16,
    dryers: u16,
}

impl DaySimulator {
    /// Creates a day simulator after validating its inputs.
    pub fn new(
        config: Rc<SimulationConfig>,
        washing_machines: u16,
        dryers: u16,
    ) -> SimulationResult<Self> {
        config.validate()?;
        SimulationConfig::validate_appliance_counts(washing_machines, dryers)?;
        Ok(Self {
            config,
            washing_machines,
            dryers,
        })
    }

    /// Runs one operating day to completion and returns its counters.
    ///
    /// New arrivals stop once the clock reaches closing time; students
    /// already inside finish on the same clock before the day is
    /// considered drained. Must execute inside a
    /// [`tokio::task::LocalSet`], since day-scoped activities are
    /// spawned with `spawn_local`.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self) -> SimulationResult<DayLog> {
        let mut sim = SimWorld::new();
        let washers = sim.create_pool(usize::from(self.washing_machines));
        let dryers = sim.create_pool(usize::from(self.dryers));
        let log = Rc::new(RefCell::new(DayLog::default()));
        let students: StudentHandles = Rc::new(RefCell::new(Vec::new()));

        let mut generator = tokio::task::spawn_local(arrival_loop(
            sim.downgrade(),
            Rc::clone(&self.config),
            washers,
            dryers,
            Rc::clone(&log),
            Rc::clone(&students),
        ));

        let mut generator_done = false;
        let mut stalled_iterations = 0u32;

        loop {
            let mut progressed = false;

            if sim.has_pending_events() {
                sim.step();
                progressed = true;
            }

            if !generator_done && generator.is_finished() {
                generator_done = true;
                progressed = true;
                match (&mut generator).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(SimulationError::InvalidState(
                            "arrival generator panicked".into(),
                        ));
                    }
                }
            }

            loop {
                let finished = {
                    let mut students = students.borrow_mut();
                    students
                        .iter()
                        .position(|handle| handle.is_finished())
                        .map(|index| students.remove(index))
                };
                let Some(handle) = finished else { break };
                progressed = true;
                match handle.await {
                    Ok(result) => {
                        result?;
                    }
                    Err(_) => {
                        return Err(SimulationError::InvalidState(
                            "student task panicked".into(),
                        ));
                    }
                }
            }

            if generator_done && students.borrow().is_empty() && !sim.has_pending_events() {
                break;
            }

            if progressed {
                stalled_iterations = 0;
            } else {
                stalled_iterations += 1;
                if stalled_iterations > STALL_PATIENCE {
                    return Err(SimulationError::InvalidState(format!(
                        "day stalled with {} students in flight and no events",
                        students.borrow().len()
                    )));
                }
            }

            yield_now().await;
        }

        let day_log = *log.borrow();
        tracing::debug!(
            ?day_log,
            drained_at = %wall_clock(sim.current_time()),
            events = sim.events_processed(),
            "day complete"
        );
        Ok(day_log)
    }
}

/// Generates arrivals minute by minute until closing time.
///
/// Every arrival attempt is counted; admitted arrivals become students
/// spawned as independent day-scoped tasks, balked arrivals are
/// discarded on the spot.
async fn arrival_loop(
    sim: WeakSimWorld,
    config: Rc<SimulationConfig>,
    washers: ResourcePool,
    dryers: ResourcePool,
    log: Rc<RefCell<DayLog>>,
    students: StudentHandles,
) -> SimulationResult<()> {
    let threshold = config.arrival_threshold();
    let closing = config.open_duration();
    let tick = minutes(1);
    let mut admitted: u32 = 0;

    while sim.current_time()? < closing {
        // Several arrivals can land within the same minute: keep drawing
        // until a draw misses the threshold.
        while u32::from(percent_draw()) <= threshold {
            log.borrow_mut().wash_attempts += 1;

            if !washers.try_admit()? {
                tracing::trace!(
                    at = %wall_clock(sim.current_time()?),
                    "student came and left: no washing machine free"
                );
                continue;
            }

            let student = Student::draw(admitted, &config)?;
            admitted += 1;
            tracing::trace!(
                at = %wall_clock(sim.current_time()?),
                student = student.id,
                "student admitted and starts loading"
            );
            let handle = tokio::task::spawn_local(does_laundry(
                sim.clone(),
                student,
                config.load_unload,
                washers.clone(),
                dryers.clone(),
                Rc::clone(&log),
            ));
            students.borrow_mut().push(handle);
        }

        sim.sleep(tick)?.await?;
    }

    Ok(())
}
