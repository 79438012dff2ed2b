use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::{Rc, Weak},
    task::Waker,
    time::Duration,
};
use tracing::instrument;

use crate::{
    error::{SimulationError, SimulationResult},
    events::{Event, EventQueue, ScheduledEvent},
    pool::PoolState,
    sleep::SleepFuture,
};

/// Internal simulation state holder.
#[derive(Debug)]
pub(crate) struct SimInner {
    pub(crate) current_time: Duration,
    pub(crate) event_queue: EventQueue,
    pub(crate) next_sequence: u64,

    // Finite-capacity appliance pools, indexed by pool id.
    pub(crate) pools: Vec<PoolState>,

    // Task management for sleep functionality.
    pub(crate) next_task_id: u64,
    pub(crate) awakened_tasks: HashSet<u64>,
    pub(crate) task_wakers: HashMap<u64, Waker>,

    // Event processing metrics.
    pub(crate) events_processed: u64,
}

impl SimInner {
    fn new() -> Self {
        Self {
            current_time: Duration::ZERO,
            event_queue: EventQueue::new(),
            next_sequence: 0,
            pools: Vec::new(),
            next_task_id: 0,
            awakened_tasks: HashSet::new(),
            task_wakers: HashMap::new(),
            events_processed: 0,
        }
    }
}

/// The central simulation coordinator for one operating day.
///
/// `SimWorld` owns the logical clock, the event queue, and the appliance
/// pool state. It uses a centralized ownership model with handle-based
/// access ([`WeakSimWorld`], [`crate::pool::ResourcePool`]) so that
/// concurrently scheduled activities never fight the borrow checker over
/// shared state.
///
/// A world starts at time zero and is discarded at the end of its day;
/// no state survives into the next day. Seeding of the random stream is
/// the caller's concern (see [`crate::rng`]), since a run deliberately
/// shares one stream across all of its days.
#[derive(Debug)]
pub struct SimWorld {
    inner: Rc<RefCell<SimInner>>,
}

impl SimWorld {
    /// Creates a new simulation world with an empty schedule and clock at zero.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimInner::new())),
        }
    }

    /// Processes the next scheduled event and advances time.
    ///
    /// Returns `true` if more events are available for processing,
    /// `false` if this was the last event or if no events are available.
    #[instrument(skip(self), level = "trace")]
    pub fn step(&mut self) -> bool {
        let mut inner = self.inner.borrow_mut();

        if let Some(scheduled_event) = inner.event_queue.pop_earliest() {
            inner.current_time = scheduled_event.time();
            Self::process_event_with_inner(&mut inner, scheduled_event.into_event());
            !inner.event_queue.is_empty()
        } else {
            false
        }
    }

    /// Processes all scheduled events until the queue is empty.
    pub fn run_until_empty(&mut self) {
        while self.step() {}
    }

    /// Returns the current simulation time since day start.
    pub fn current_time(&self) -> Duration {
        self.inner.borrow().current_time
    }

    /// Schedules an event to execute after the specified delay from the current time.
    pub fn schedule_event(&self, event: Event, delay: Duration) {
        let mut inner = self.inner.borrow_mut();
        let scheduled_time = inner.current_time + delay;
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let scheduled_event = ScheduledEvent::new(scheduled_time, event, sequence);
        inner.event_queue.schedule(scheduled_event);
    }

    /// Creates a weak reference to this simulation world.
    ///
    /// Day-scoped activities hold weak references so they can outlive a
    /// dropped world without keeping it alive; every access through the
    /// handle reports shutdown once the world is gone.
    pub fn downgrade(&self) -> WeakSimWorld {
        WeakSimWorld {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if there are events waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().event_queue.is_empty()
    }

    /// Returns the number of events waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().event_queue.len()
    }

    /// Returns the number of events processed so far.
    pub fn events_processed(&self) -> u64 {
        self.inner.borrow().events_processed
    }

    /// Sleep for the specified duration in simulation time.
    ///
    /// Schedules a wake event and returns a future that completes once
    /// the clock has advanced past it.
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        let task_id = self.generate_task_id();
        self.schedule_event(Event::Wake { task_id }, duration);
        SleepFuture::new(self.downgrade(), task_id)
    }

    /// Generate a unique task id for sleep operations.
    fn generate_task_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let task_id = inner.next_task_id;
        inner.next_task_id += 1;
        task_id
    }

    /// Check whether a sleeping task's wake event has been processed.
    pub(crate) fn is_task_awake(&self, task_id: u64) -> bool {
        self.inner.borrow().awakened_tasks.contains(&task_id)
    }

    /// Register a waker to be called when the task's wake event fires.
    pub(crate) fn register_task_waker(&self, task_id: u64, waker: Waker) {
        self.inner
            .borrow_mut()
            .task_wakers
            .insert(task_id, waker);
    }

    /// Run a closure with mutable access to the inner state.
    ///
    /// Used by the pool operations in [`crate::pool`], which live in
    /// their own module but mutate world-owned state.
    pub(crate) fn with_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SimInner) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }

    fn process_event_with_inner(inner: &mut SimInner, event: Event) {
        inner.events_processed += 1;

        match event {
            Event::Wake { task_id } => {
                inner.awakened_tasks.insert(task_id);
                if let Some(waker) = inner.task_wakers.remove(&task_id) {
                    waker.wake();
                }
            }
        }
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak reference to a simulation world.
///
/// Provides handle-based access without holding a strong reference that
/// would keep the day alive. Every operation returns
/// [`SimulationError::SimulationShutdown`] once the world is dropped.
#[derive(Debug)]
pub struct WeakSimWorld {
    inner: Weak<RefCell<SimInner>>,
}

impl WeakSimWorld {
    /// Attempts to upgrade this weak reference to a strong reference.
    pub fn upgrade(&self) -> SimulationResult<SimWorld> {
        self.inner
            .upgrade()
            .map(|inner| SimWorld { inner })
            .ok_or(SimulationError::SimulationShutdown)
    }

    /// Returns the current simulation time since day start.
    pub fn current_time(&self) -> SimulationResult<Duration> {
        Ok(self.upgrade()?.current_time())
    }

    /// Sleep for the specified duration in simulation time.
    pub fn sleep(&self, duration: Duration) -> SimulationResult<SleepFuture> {
        Ok(self.upgrade()?.sleep(duration))
    }
}

impl Clone for WeakSimWorld {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_lifecycle() {
        let mut sim = SimWorld::new();

        assert_eq!(sim.current_time(), Duration::ZERO);
        assert!(!sim.has_pending_events());

        sim.schedule_event(Event::Wake { task_id: 1 }, Duration::from_secs(60));
        assert!(sim.has_pending_events());
        assert_eq!(sim.pending_event_count(), 1);
        assert_eq!(sim.current_time(), Duration::ZERO);

        let has_more = sim.step();
        assert!(!has_more);
        assert_eq!(sim.current_time(), Duration::from_secs(60));
        assert!(!sim.has_pending_events());
    }

    #[test]
    fn events_process_in_time_order() {
        let mut sim = SimWorld::new();

        sim.schedule_event(Event::Wake { task_id: 3 }, Duration::from_secs(180));
        sim.schedule_event(Event::Wake { task_id: 1 }, Duration::from_secs(60));
        sim.schedule_event(Event::Wake { task_id: 2 }, Duration::from_secs(120));

        assert!(sim.step());
        assert_eq!(sim.current_time(), Duration::from_secs(60));
        assert!(sim.step());
        assert_eq!(sim.current_time(), Duration::from_secs(120));
        assert!(!sim.step());
        assert_eq!(sim.current_time(), Duration::from_secs(180));
    }

    #[test]
    fn run_until_empty_drains_queue() {
        let mut sim = SimWorld::new();

        sim.schedule_event(Event::Wake { task_id: 1 }, Duration::from_secs(60));
        sim.schedule_event(Event::Wake { task_id: 2 }, Duration::from_secs(120));

        sim.run_until_empty();

        assert_eq!(sim.current_time(), Duration::from_secs(120));
        assert!(!sim.has_pending_events());
        assert_eq!(sim.events_processed(), 2);
    }

    #[test]
    fn same_instant_keeps_scheduling_order() {
        let mut sim = SimWorld::new();
        let instant = Duration::from_secs(60);

        sim.schedule_event(Event::Wake { task_id: 2 }, instant);
        sim.schedule_event(Event::Wake { task_id: 1 }, instant);
        sim.schedule_event(Event::Wake { task_id: 3 }, instant);

        assert!(sim.step());
        assert_eq!(sim.current_time(), instant);
        assert!(sim.step());
        assert_eq!(sim.current_time(), instant);
        assert!(!sim.step());
        assert_eq!(sim.current_time(), instant);
    }

    #[test]
    fn weak_reference_reports_shutdown() {
        let sim = SimWorld::new();
        let weak = sim.downgrade();

        assert_eq!(weak.current_time().unwrap(), Duration::ZERO);

        drop(sim);

        assert_eq!(
            weak.current_time(),
            Err(SimulationError::SimulationShutdown)
        );
    }
}
