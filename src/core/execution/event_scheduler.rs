use crate::core::types::{ComponentId, SimTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A pending re-evaluation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub target: ComponentId,
    /// `ComponentId::NULL` for external stimuli
    pub source: ComponentId,
    pub fire_time: SimTime,
}

impl SimulationEvent {
    pub fn new(target: ComponentId, source: ComponentId, fire_time: SimTime) -> Self {
        Self {
            target,
            source,
            fire_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub sequence_num: u64,
    pub event: SimulationEvent,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event.fire_time == other.event.fire_time && self.sequence_num == other.sequence_num
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .event
            .fire_time
            .cmp(&self.event.fire_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered event queue with FIFO tie breaking
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventScheduler {
    /// Create a new EventScheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event at its absolute fire time
    pub fn schedule_event(&mut self, event: SimulationEvent) {
        self.event_queue.push(ScheduledEvent {
            sequence_num: self.sequence_counter,
            event,
        });
        self.sequence_counter += 1;
    }

    /// Remove and return every event due at the earliest pending time, in insertion order
    pub fn get_next_time_events(&mut self) -> Vec<SimulationEvent> {
        let mut events = Vec::new();

        if let Some(next_time) = self.peek_next_time() {
            while let Some(scheduled) = self.event_queue.peek() {
                if scheduled.event.fire_time != next_time {
                    break;
                }
                if let Some(scheduled) = self.event_queue.pop() {
                    events.push(scheduled.event);
                }
            }
        }

        events
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    /// Fire time of the next event without removing it
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|scheduled| scheduled.event.fire_time)
    }

    /// Drop every event targeting `id`, returns how many were removed
    pub fn remove_events_for(&mut self, id: ComponentId) -> usize {
        let before = self.event_queue.len();
        self.event_queue.retain(|scheduled| scheduled.event.target != id);
        before - self.event_queue.len()
    }

    /// Pending events in firing order
    pub fn pending(&self) -> Vec<SimulationEvent> {
        let mut scheduled: Vec<&ScheduledEvent> = self.event_queue.iter().collect();
        // Ord is reversed, so sorting descending yields earliest first
        scheduled.sort_by(|a, b| b.cmp(a));
        scheduled.into_iter().map(|s| s.event).collect()
    }

    pub fn clear(&mut self) {
        self.event_queue.clear();
    }
}
