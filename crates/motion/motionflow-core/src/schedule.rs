//! Cooperative task queue.
//!
//! Every component owns a `Scheduler<T>` where `T` names what should happen
//! when a task comes due. Frame tasks run on the next pump; timeouts and
//! intervals run on the first pump at or after their deadline. Handles are
//! explicit so callers can cancel exactly what they scheduled.

use crate::ids::TaskId;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Due {
    Frame,
    At(f64),
    Every { next: f64, period: f64 },
}

#[derive(Clone, Debug)]
struct Pending<T> {
    id: TaskId,
    due: Due,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// `requestAnimationFrame`
    pub fn request_frame(&mut self, task: T) -> TaskId {
        let id = self.alloc();
        self.pending.push(Pending {
            id,
            due: Due::Frame,
            task,
        });
        id
    }

    /// `setTimeout`
    pub fn set_timeout(&mut self, now: f64, delay_ms: f64, task: T) -> TaskId {
        let id = self.alloc();
        self.pending.push(Pending {
            id,
            due: Due::At(now + delay_ms.max(0.0)),
            task,
        });
        id
    }

    /// `setInterval`
    pub fn set_interval(&mut self, now: f64, period_ms: f64, task: T) -> TaskId {
        let id = self.alloc();
        let period = period_ms.max(1.0);
        self.pending.push(Pending {
            id,
            due: Due::Every {
                next: now + period,
                period,
            },
            task,
        });
        id
    }

    /// Cancels a pending task. Returns false when it already ran or was
    /// never scheduled here.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    /// Cancels the handle in `slot` (if any) and empties it.
    pub fn cancel_slot(&mut self, slot: &mut Option<TaskId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Earliest timer deadline, if any timer is pending. Frame tasks are
    /// always due and are not reported here.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .iter()
            .filter_map(|p| match p.due {
                Due::Frame => None,
                Due::At(t) => Some(t),
                Due::Every { next, .. } => Some(next),
            })
            .reduce(f64::min)
    }

    /// Removes and returns every task due at `now`, in scheduling order.
    /// Intervals stay queued with their next deadline advanced. Tasks
    /// scheduled while the caller processes the batch wait for the next call.
    pub fn take_due(&mut self, now: f64) -> Vec<(TaskId, T)> {
        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(self.pending.len());
        for mut p in self.pending.drain(..) {
            match p.due {
                Due::Frame => due.push((p.id, p.task)),
                Due::At(t) if t <= now => due.push((p.id, p.task)),
                Due::Every { next, period } if next <= now => {
                    due.push((p.id, p.task.clone()));
                    let mut next = next + period;
                    if next <= now {
                        // Skip missed beats instead of bursting after a stall.
                        next = now + period;
                    }
                    p.due = Due::Every { next, period };
                    keep.push(p);
                }
                _ => keep.push(p),
            }
        }
        self.pending = keep;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_run_once_per_take() {
        let mut s = Scheduler::new();
        s.request_frame("a");
        s.request_frame("b");
        let due: Vec<_> = s.take_due(0.0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(due, vec!["a", "b"]);
        assert!(s.is_idle());
    }

    #[test]
    fn timeout_waits_for_deadline() {
        let mut s = Scheduler::new();
        s.set_timeout(100.0, 60.0, "t");
        assert!(s.take_due(150.0).is_empty());
        assert_eq!(s.next_deadline(), Some(160.0));
        assert_eq!(s.take_due(160.0).len(), 1);
        assert!(s.is_idle());
    }

    #[test]
    fn interval_repeats_until_cancelled() {
        let mut s = Scheduler::new();
        let id = s.set_interval(0.0, 200.0, "i");
        assert!(s.take_due(199.0).is_empty());
        assert_eq!(s.take_due(200.0).len(), 1);
        assert_eq!(s.take_due(400.0).len(), 1);
        assert!(s.cancel(id));
        assert!(s.take_due(10_000.0).is_empty());
    }

    #[test]
    fn cancel_slot_clears_handle() {
        let mut s = Scheduler::new();
        let mut slot = Some(s.request_frame(()));
        s.cancel_slot(&mut slot);
        assert!(slot.is_none());
        assert!(s.is_idle());
    }
}
