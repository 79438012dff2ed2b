//! Students and their multi-stage laundry workflow.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::{
    config::{minutes_f64, SimulationConfig},
    day::{wall_clock, DayLog},
    error::SimulationResult,
    pool::ResourcePool,
    program::ApplianceProgram,
    sim::WeakSimWorld,
    variate::{percent_draw, select_program, truncated_normal},
};

/// The dry stage a student intends to run after washing.
#[derive(Debug, Clone, PartialEq)]
pub struct DryStage {
    /// Selected dryer program.
    pub program: ApplianceProgram,
    /// Delay before the student returns to unload the dryer.
    pub pickup: Duration,
}

/// An admitted student with all stochastic choices fixed at creation.
///
/// Everything except the id is drawn once when the student is admitted
/// and never changes for the student's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    /// Admission-order id within the day.
    pub id: u32,
    /// Selected washing-machine program.
    pub wash_program: ApplianceProgram,
    /// Delay before the student returns to unload the washing machine.
    pub wash_pickup: Duration,
    /// The intended dry stage, or `None` when the student skips the dryer.
    pub dry_stage: Option<DryStage>,
}

impl Student {
    /// Draws a new student from the configured distributions.
    ///
    /// Draw order is part of the model's deterministic contract: wash
    /// program, wash pickup delay, dryer-usage decision, then (only for
    /// dryer users) dry program and dry pickup delay.
    pub fn draw(id: u32, config: &SimulationConfig) -> SimulationResult<Self> {
        let wash_program = select_program(&config.wash_programs)?;
        let wash_pickup =
            minutes_f64(truncated_normal(config.pickup_mean, config.pickup_std_dev)?);

        // Usage when the weight is at most the draw: with the default
        // weight of 40 this is the inherited ~60% dryer usage.
        let dry_stage = if config.dryer_usage_weight <= percent_draw() {
            let program = select_program(&config.dry_programs)?;
            let pickup =
                minutes_f64(truncated_normal(config.pickup_mean, config.pickup_std_dev)?);
            Some(DryStage { program, pickup })
        } else {
            None
        };

        Ok(Self {
            id,
            wash_program,
            wash_pickup,
            dry_stage,
        })
    }
}

/// How a student's day at the laundrette ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentOutcome {
    /// Washed and left without wanting the dryer.
    WashedOnly,
    /// Washed, then dried.
    DriedToo,
    /// Washed, wanted the dryer, but every dryer was taken.
    DryBalked,
}

/// Drives one admitted student through the facility.
///
/// The wash stage always proceeds to [`ResourcePool::acquire`]: the
/// admission check already happened at arrival, and any same-minute
/// over-admission just queues briefly. The dry stage instead balks on a
/// full pool without ever queueing.
///
/// Side effects are confined to the shared [`DayLog`] counters and pool
/// occupancy. The wash-attempt counter is *not* touched here; it is the
/// arrival counter maintained by the generator in [`crate::day`].
pub async fn does_laundry(
    sim: WeakSimWorld,
    student: Student,
    load_unload: Duration,
    washers: ResourcePool,
    dryers: ResourcePool,
    log: Rc<RefCell<DayLog>>,
) -> SimulationResult<StudentOutcome> {
    let wash_slot = washers.acquire().await?;
    tracing::trace!(
        at = %wall_clock(sim.current_time()?),
        student = student.id,
        program = %student.wash_program.name,
        "starts a washing machine"
    );

    sim.sleep(load_unload)?.await?;
    sim.sleep(student.wash_program.duration)?.await?;
    sim.sleep(student.wash_pickup)?.await?;
    sim.sleep(load_unload)?.await?;

    log.borrow_mut().wash_completions += 1;
    drop(wash_slot);

    let Some(stage) = student.dry_stage else {
        tracing::trace!(
            at = %wall_clock(sim.current_time()?),
            student = student.id,
            "leaves without drying"
        );
        return Ok(StudentOutcome::WashedOnly);
    };

    log.borrow_mut().dry_attempts += 1;
    if !dryers.try_admit()? {
        tracing::trace!(
            at = %wall_clock(sim.current_time()?),
            student = student.id,
            "cannot use a dryer and leaves"
        );
        return Ok(StudentOutcome::DryBalked);
    }

    let dry_slot = dryers.acquire().await?;
    tracing::trace!(
        at = %wall_clock(sim.current_time()?),
        student = student.id,
        program = %stage.program.name,
        "starts drying"
    );

    sim.sleep(load_unload)?.await?;
    sim.sleep(stage.program.duration)?.await?;
    sim.sleep(stage.pickup)?.await?;
    sim.sleep(load_unload)?.await?;

    log.borrow_mut().dry_completions += 1;
    drop(dry_slot);

    tracing::trace!(
        at = %wall_clock(sim.current_time()?),
        student = student.id,
        "done for the day"
    );
    Ok(StudentOutcome::DriedToo)
}
