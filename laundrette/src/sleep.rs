//! Sleep functionality for simulation time.
//!
//! Every timed wait in the model (loading, program cycles, pickup
//! delays, the arrival generator's one-minute tick) is a [`SleepFuture`]
//! that completes when the simulation clock reaches its wake time.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::{SimulationResult, WeakSimWorld};

/// Future that completes after a specified simulation-time duration.
///
/// Created by `SimWorld::sleep`, which schedules a wake event for the
/// requested duration. Polling checks whether the event has been
/// processed and otherwise registers the task's waker with the world.
pub struct SleepFuture {
    sim: WeakSimWorld,
    task_id: u64,
    completed: bool,
}

impl SleepFuture {
    /// Creates a new sleep future for a scheduled wake event.
    ///
    /// Called by `SimWorld::sleep`; not meant to be constructed directly.
    pub(crate) fn new(sim: WeakSimWorld, task_id: u64) -> Self {
        Self {
            sim,
            task_id,
            completed: false,
        }
    }
}

impl Future for SleepFuture {
    type Output = SimulationResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.completed {
            return Poll::Ready(Ok(()));
        }

        let sim = match self.sim.upgrade() {
            Ok(sim) => sim,
            Err(err) => return Poll::Ready(Err(err)),
        };

        if sim.is_task_awake(self.task_id) {
            self.completed = true;
            Poll::Ready(Ok(()))
        } else {
            sim.register_task_waker(self.task_id, cx.waker().clone());
            Poll::Pending
        }
    }
}
