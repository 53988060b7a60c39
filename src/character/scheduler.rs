//! Per-actor timer list
//!
//! Delayed work (condition reverts, invulnerability windows, destruction,
//! damage over time, timed slows) is queued here and polled once per tick by
//! the actor. Entries are kept in a min-heap ordered by due time, then by
//! insertion order.
//!
//! Exclusive slots model "only one of this kind may be outstanding": scheduling
//! into an occupied slot cancels the previous entry. Cancellation marks the
//! handle dead; dead entries are dropped when they reach the top of the heap.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::modifiers::ModifierSource;
use super::resistance::DamageRequest;

/// Identifies one scheduled entry for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Kinds of timer of which at most one may be pending at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    ConditionRevert,
    Invulnerability,
    Destruction,
    DamageOverTime,
    SpeedModifier(ModifierSource),
}

/// Work to run once an entry comes due.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    /// Undo a temporary condition change
    RevertCondition { restore_gravity: bool },
    EndInvulnerability,
    /// Finish a delayed death (destroy or disable the actor)
    Destroy,
    /// Apply one damage-over-time hit; `remaining` counts this one
    DamageOverTime {
        request: DamageRequest,
        remaining: u32,
        interval: f32,
    },
    EndSpeedModifier(ModifierSource),
}

#[derive(Debug)]
struct Entry {
    due: f32,
    seq: u64,
    slot: Option<TimerSlot>,
    task: ScheduledTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest due, then earliest scheduled)
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    slots: HashMap<TimerSlot, TaskHandle>,
    cancelled: HashSet<TaskHandle>,
}

impl Scheduler {
    /// Queue `task` to run once the actor clock reaches `due`.
    pub fn schedule(&mut self, due: f32, task: ScheduledTask) -> TaskHandle {
        self.push(due, None, task)
    }

    /// Queue `task` in an exclusive slot, cancelling whatever was there.
    pub fn schedule_exclusive(&mut self, slot: TimerSlot, due: f32, task: ScheduledTask) -> TaskHandle {
        self.cancel_slot(&slot);
        let handle = self.push(due, Some(slot.clone()), task);
        self.slots.insert(slot, handle);
        handle
    }

    fn push(&mut self, due: f32, slot: Option<TimerSlot>, task: ScheduledTask) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, slot, task });
        TaskHandle(seq)
    }

    pub fn cancel(&mut self, handle: TaskHandle) {
        if self.heap.iter().any(|e| e.seq == handle.0) {
            self.cancelled.insert(handle);
        }
        self.slots.retain(|_, h| *h != handle);
    }

    pub fn cancel_slot(&mut self, slot: &TimerSlot) -> bool {
        match self.slots.remove(slot) {
            Some(handle) => {
                self.cancelled.insert(handle);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, slot: &TimerSlot) -> bool {
        self.slots.contains_key(slot)
    }

    /// Due time of the entry occupying `slot`, if any.
    pub fn due_time(&self, slot: &TimerSlot) -> Option<f32> {
        let handle = self.slots.get(slot)?;
        self.heap.iter().find(|e| e.seq == handle.0).map(|e| e.due)
    }

    /// Number of live (not cancelled) entries.
    pub fn pending_count(&self) -> usize {
        self.heap
            .iter()
            .filter(|e| !self.cancelled.contains(&TaskHandle(e.seq)))
            .count()
    }

    /// Remove and return every live task due at or before `now`, in due order.
    pub fn poll(&mut self, now: f32) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|e| e.due <= now) {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            let handle = TaskHandle(entry.seq);
            if self.cancelled.remove(&handle) {
                continue;
            }
            if let Some(slot) = &entry.slot {
                if self.slots.get(slot) == Some(&handle) {
                    self.slots.remove(slot);
                }
            }
            due.push(entry.task);
        }
        due
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.slots.clear();
        self.cancelled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_returns_tasks_in_due_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(2.0, ScheduledTask::Destroy);
        scheduler.schedule(1.0, ScheduledTask::EndInvulnerability);
        let due = scheduler.poll(2.0);
        assert_eq!(due, vec![ScheduledTask::EndInvulnerability, ScheduledTask::Destroy]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_poll_leaves_future_tasks() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(1.5, ScheduledTask::Destroy);
        assert!(scheduler.poll(1.0).is_empty());
        assert_eq!(scheduler.poll(1.5).len(), 1);
    }

    #[test]
    fn test_exclusive_slot_replaces() {
        let mut scheduler = Scheduler::default();
        let revert = ScheduledTask::RevertCondition { restore_gravity: false };
        scheduler.schedule_exclusive(TimerSlot::ConditionRevert, 2.0, revert.clone());
        scheduler.schedule_exclusive(TimerSlot::ConditionRevert, 2.5, revert.clone());

        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.due_time(&TimerSlot::ConditionRevert), Some(2.5));
        assert!(scheduler.poll(2.0).is_empty(), "Replaced entry must not fire");
        assert_eq!(scheduler.poll(2.5), vec![revert]);
        assert!(!scheduler.is_scheduled(&TimerSlot::ConditionRevert));
    }

    #[test]
    fn test_cancelled_handle_never_fires() {
        let mut scheduler = Scheduler::default();
        let handle = scheduler.schedule(1.0, ScheduledTask::Destroy);
        scheduler.cancel(handle);
        assert!(scheduler.poll(5.0).is_empty());
    }
}
