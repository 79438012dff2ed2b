//! Finite-capacity appliance pools with balking and queued acquisition.
//!
//! A pool's mutable state lives inside the simulation world; user code
//! works through the cloneable [`ResourcePool`] handle. Admission
//! ([`ResourcePool::try_admit`]) is a read-only occupancy check that
//! never reserves anything, while [`ResourcePool::acquire`] enqueues a
//! FIFO ticket and suspends until a slot is free and the ticket reaches
//! the head of the queue. Occupancy therefore never exceeds capacity,
//! even when several same-minute arrivals pass the admission check
//! before any of them starts acquiring; the surplus simply queues.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::{
    error::{SimulationError, SimulationResult},
    sim::{SimWorld, WeakSimWorld},
};

/// Identifier of a pool inside its simulation world.
pub(crate) type PoolId = usize;

/// World-owned state of one appliance pool.
#[derive(Debug)]
pub(crate) struct PoolState {
    capacity: usize,
    occupied: usize,
    next_ticket: u64,
    waiters: VecDeque<u64>,
    wakers: HashMap<u64, Waker>,
}

impl PoolState {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            occupied: 0,
            next_ticket: 0,
            waiters: VecDeque::new(),
            wakers: HashMap::new(),
        }
    }

    /// Wake the queue head if a slot is free for it to claim.
    fn wake_front(&mut self) {
        if self.occupied < self.capacity {
            if let Some(next) = self.waiters.front().copied() {
                if let Some(waker) = self.wakers.remove(&next) {
                    waker.wake();
                }
            }
        }
    }
}

impl SimWorld {
    /// Creates a new appliance pool with the given slot capacity.
    ///
    /// Pools are created fresh for each simulated day and die with their
    /// world; there is no cross-day occupancy.
    pub fn create_pool(&self, capacity: usize) -> ResourcePool {
        let id = self.with_inner(|inner| {
            inner.pools.push(PoolState::new(capacity));
            inner.pools.len() - 1
        });
        ResourcePool {
            sim: self.downgrade(),
            id,
        }
    }

    fn pool_try_admit(&self, id: PoolId) -> SimulationResult<bool> {
        self.with_inner(|inner| {
            let pool = pool_ref(&inner.pools, id)?;
            Ok(pool.occupied < pool.capacity)
        })
    }

    fn pool_occupied(&self, id: PoolId) -> SimulationResult<usize> {
        self.with_inner(|inner| Ok(pool_ref(&inner.pools, id)?.occupied))
    }

    fn pool_capacity(&self, id: PoolId) -> SimulationResult<usize> {
        self.with_inner(|inner| Ok(pool_ref(&inner.pools, id)?.capacity))
    }

    fn pool_enqueue_waiter(&self, id: PoolId) -> SimulationResult<u64> {
        self.with_inner(|inner| {
            let pool = pool_mut(&mut inner.pools, id)?;
            let ticket = pool.next_ticket;
            pool.next_ticket += 1;
            pool.waiters.push_back(ticket);
            Ok(ticket)
        })
    }

    fn pool_try_claim(&self, id: PoolId, ticket: u64) -> SimulationResult<bool> {
        self.with_inner(|inner| {
            let pool = pool_mut(&mut inner.pools, id)?;
            if pool.occupied < pool.capacity && pool.waiters.front() == Some(&ticket) {
                pool.waiters.pop_front();
                pool.wakers.remove(&ticket);
                pool.occupied += 1;
                // A multi-slot pool may still have room for the next ticket.
                pool.wake_front();
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }

    fn pool_register_waker(&self, id: PoolId, ticket: u64, waker: Waker) -> SimulationResult<()> {
        self.with_inner(|inner| {
            pool_mut(&mut inner.pools, id)?.wakers.insert(ticket, waker);
            Ok(())
        })
    }

    fn pool_cancel_waiter(&self, id: PoolId, ticket: u64) {
        self.with_inner(|inner| {
            if let Ok(pool) = pool_mut(&mut inner.pools, id) {
                if let Some(position) = pool.waiters.iter().position(|&t| t == ticket) {
                    pool.waiters.remove(position);
                }
                pool.wakers.remove(&ticket);
                // The cancelled ticket may have been blocking the head.
                pool.wake_front();
            }
        });
    }

    fn pool_release(&self, id: PoolId) -> SimulationResult<()> {
        self.with_inner(|inner| {
            let pool = pool_mut(&mut inner.pools, id)?;
            if pool.occupied == 0 {
                return Err(SimulationError::InvalidState(format!(
                    "release on empty pool {id}"
                )));
            }
            pool.occupied -= 1;
            pool.wake_front();
            Ok(())
        })
    }
}

fn pool_ref(pools: &[PoolState], id: PoolId) -> SimulationResult<&PoolState> {
    pools
        .get(id)
        .ok_or_else(|| SimulationError::InvalidState(format!("unknown pool {id}")))
}

fn pool_mut(pools: &mut [PoolState], id: PoolId) -> SimulationResult<&mut PoolState> {
    pools
        .get_mut(id)
        .ok_or_else(|| SimulationError::InvalidState(format!("unknown pool {id}")))
}

/// Handle to a finite-capacity pool of identical appliances.
///
/// Cloning the handle does not clone the pool; all clones address the
/// same world-owned slot state.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    sim: WeakSimWorld,
    id: PoolId,
}

impl ResourcePool {
    /// Read-only admission check: `true` while a slot is free.
    ///
    /// Does not reserve anything. An arrival that balks on `false` never
    /// enters the acquire queue.
    pub fn try_admit(&self) -> SimulationResult<bool> {
        self.sim.upgrade()?.pool_try_admit(self.id)
    }

    /// Begin acquiring a slot.
    ///
    /// The returned future enqueues a FIFO ticket on first poll and
    /// resolves to a [`SlotGuard`] once a slot is free and the ticket is
    /// at the head of the queue. Dropping the future before it resolves
    /// withdraws the ticket.
    pub fn acquire(&self) -> AcquireFuture {
        AcquireFuture {
            sim: self.sim.clone(),
            id: self.id,
            ticket: None,
            claimed: false,
        }
    }

    /// Number of slots currently held.
    pub fn occupied(&self) -> SimulationResult<usize> {
        self.sim.upgrade()?.pool_occupied(self.id)
    }

    /// Total slot capacity of this pool.
    pub fn capacity(&self) -> SimulationResult<usize> {
        self.sim.upgrade()?.pool_capacity(self.id)
    }
}

/// Future returned by [`ResourcePool::acquire`].
#[derive(Debug)]
pub struct AcquireFuture {
    sim: WeakSimWorld,
    id: PoolId,
    ticket: Option<u64>,
    claimed: bool,
}

impl Future for AcquireFuture {
    type Output = SimulationResult<SlotGuard>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        let sim = match this.sim.upgrade() {
            Ok(sim) => sim,
            Err(err) => return Poll::Ready(Err(err)),
        };

        let ticket = match this.ticket {
            Some(ticket) => ticket,
            None => match sim.pool_enqueue_waiter(this.id) {
                Ok(ticket) => {
                    this.ticket = Some(ticket);
                    ticket
                }
                Err(err) => return Poll::Ready(Err(err)),
            },
        };

        match sim.pool_try_claim(this.id, ticket) {
            Ok(true) => {
                this.claimed = true;
                Poll::Ready(Ok(SlotGuard {
                    sim: this.sim.clone(),
                    id: this.id,
                }))
            }
            Ok(false) => {
                if let Err(err) = sim.pool_register_waker(this.id, ticket, cx.waker().clone()) {
                    return Poll::Ready(Err(err));
                }
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}

impl Drop for AcquireFuture {
    fn drop(&mut self) {
        // A dropped ticket must not wedge the FIFO queue.
        if let (Some(ticket), false) = (self.ticket, self.claimed) {
            if let Ok(sim) = self.sim.upgrade() {
                sim.pool_cancel_waiter(self.id, ticket);
            }
        }
    }
}

/// An acquired slot; the slot is released when the guard is dropped.
///
/// Releasing wakes the next queued ticket, if any.
#[derive(Debug)]
pub struct SlotGuard {
    sim: WeakSimWorld,
    id: PoolId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if let Ok(sim) = self.sim.upgrade() {
            let _ = sim.pool_release(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::task::yield_now;

    fn run_local<F: Future>(future: F) -> F::Output {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("failed to build runtime");
        let local = tokio::task::LocalSet::new();
        runtime.block_on(local.run_until(future))
    }

    #[test]
    fn uncontended_acquire_is_immediate() {
        run_local(async {
            let sim = SimWorld::new();
            let pool = sim.create_pool(2);

            assert!(pool.try_admit().unwrap());
            let first = pool.acquire().await.unwrap();
            assert_eq!(pool.occupied().unwrap(), 1);
            assert!(pool.try_admit().unwrap());

            let second = pool.acquire().await.unwrap();
            assert_eq!(pool.occupied().unwrap(), 2);
            assert!(!pool.try_admit().unwrap());

            drop(first);
            assert_eq!(pool.occupied().unwrap(), 1);
            assert!(pool.try_admit().unwrap());
            drop(second);
            assert_eq!(pool.occupied().unwrap(), 0);
        });
    }

    #[test]
    fn waiters_are_served_in_fifo_order() {
        run_local(async {
            let sim = SimWorld::new();
            let pool = sim.create_pool(1);

            let holder = pool.acquire().await.unwrap();
            assert!(!pool.try_admit().unwrap());

            let served = Rc::new(RefCell::new(Vec::new()));
            let mut handles = Vec::new();
            for name in ["first", "second", "third"] {
                let pool = pool.clone();
                let served = Rc::clone(&served);
                handles.push(tokio::task::spawn_local(async move {
                    let _slot = pool.acquire().await.unwrap();
                    served.borrow_mut().push(name);
                }));
            }

            // Let every waiter enqueue its ticket before the slot frees.
            for _ in 0..4 {
                yield_now().await;
            }
            drop(holder);

            while handles.iter().any(|h| !h.is_finished()) {
                yield_now().await;
            }

            assert_eq!(*served.borrow(), vec!["first", "second", "third"]);
            assert_eq!(pool.occupied().unwrap(), 0);
        });
    }

    #[test]
    fn occupancy_never_exceeds_capacity_under_burst() {
        run_local(async {
            let mut sim = SimWorld::new();
            let pool = sim.create_pool(2);
            let weak = sim.downgrade();

            let mut handles = Vec::new();
            for _ in 0..5 {
                let pool = pool.clone();
                let weak = weak.clone();
                handles.push(tokio::task::spawn_local(async move {
                    let _slot = pool.acquire().await.unwrap();
                    weak.sleep(Duration::from_secs(60)).unwrap().await.unwrap();
                }));
            }

            while handles.iter().any(|h| !h.is_finished()) {
                if sim.has_pending_events() {
                    sim.step();
                }
                assert!(pool.occupied().unwrap() <= pool.capacity().unwrap());
                yield_now().await;
            }

            assert_eq!(pool.occupied().unwrap(), 0);
        });
    }

    #[test]
    fn release_on_empty_pool_is_an_error() {
        let sim = SimWorld::new();
        let pool = sim.create_pool(1);
        let world = pool.sim.upgrade().unwrap();
        assert!(matches!(
            world.pool_release(pool.id),
            Err(SimulationError::InvalidState(_))
        ));
    }

    #[test]
    fn handles_outlive_their_world() {
        let sim = SimWorld::new();
        let pool = sim.create_pool(1);
        drop(sim);
        assert_eq!(pool.try_admit(), Err(SimulationError::SimulationShutdown));
    }
}
