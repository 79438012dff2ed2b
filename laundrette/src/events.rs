use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

/// Events that can be scheduled in the simulation.
///
/// The laundrette model drives every activity through timed waits, so a
/// single wake event suffices; pool handoffs wake their waiters directly
/// through registered wakers rather than through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A wake event for a sleeping task.
    Wake {
        /// The unique identifier of the task to wake.
        task_id: u64,
    },
}

/// An event scheduled for execution at a specific simulation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    time: Duration,
    event: Event,
    sequence: u64,
}

impl ScheduledEvent {
    /// Creates a new scheduled event.
    pub fn new(time: Duration, event: Event, sequence: u64) -> Self {
        Self {
            time,
            event,
            sequence,
        }
    }

    /// Returns the scheduled execution time.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Returns a reference to the event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Consumes the scheduled event and returns the event.
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap, but the earliest time must pop first,
        // so both comparisons are reversed. Sequence numbers break ties
        // between events landing on the same instant, which pins the
        // scheduler tie-break to scheduling order.
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            other => other,
        }
    }
}

/// A priority queue of scheduled events in chronological order.
///
/// Events at the same instant are processed in the order they were
/// scheduled, which for activities created in the same simulated minute
/// equals activity-creation order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Schedules an event for execution.
    pub fn schedule(&mut self, event: ScheduledEvent) {
        self.heap.push(event);
    }

    /// Removes and returns the earliest scheduled event.
    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of events in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();

        queue.schedule(ScheduledEvent::new(
            Duration::from_secs(300),
            Event::Wake { task_id: 3 },
            2,
        ));
        queue.schedule(ScheduledEvent::new(
            Duration::from_secs(100),
            Event::Wake { task_id: 1 },
            0,
        ));
        queue.schedule(ScheduledEvent::new(
            Duration::from_secs(200),
            Event::Wake { task_id: 2 },
            1,
        ));

        let first = queue.pop_earliest().unwrap();
        assert_eq!(first.time(), Duration::from_secs(100));
        assert_eq!(first.event(), &Event::Wake { task_id: 1 });

        let second = queue.pop_earliest().unwrap();
        assert_eq!(second.time(), Duration::from_secs(200));

        let third = queue.pop_earliest().unwrap();
        assert_eq!(third.time(), Duration::from_secs(300));

        assert!(queue.is_empty());
    }

    #[test]
    fn same_instant_resolves_by_sequence() {
        let mut queue = EventQueue::new();
        let instant = Duration::from_secs(60);

        queue.schedule(ScheduledEvent::new(instant, Event::Wake { task_id: 3 }, 2));
        queue.schedule(ScheduledEvent::new(instant, Event::Wake { task_id: 1 }, 0));
        queue.schedule(ScheduledEvent::new(instant, Event::Wake { task_id: 2 }, 1));

        assert_eq!(
            queue.pop_earliest().unwrap().into_event(),
            Event::Wake { task_id: 1 }
        );
        assert_eq!(
            queue.pop_earliest().unwrap().into_event(),
            Event::Wake { task_id: 2 }
        );
        assert_eq!(
            queue.pop_earliest().unwrap().into_event(),
            Event::Wake { task_id: 3 }
        );
    }

    #[test]
    fn len_tracks_contents() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.len(), 0);

        queue.schedule(ScheduledEvent::new(
            Duration::from_secs(1),
            Event::Wake { task_id: 1 },
            0,
        ));
        assert_eq!(queue.len(), 1);

        queue.pop_earliest();
        assert!(queue.is_empty());
    }
}
