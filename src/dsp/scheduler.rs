//! Cancellable tasks scheduled on the context clock.

/// Handle returned by [`Scheduler::schedule`], used to cancel a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    // Sorted by due time; equal times keep scheduling order.
    tasks: Vec<(f64, TaskId, T)>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler {
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    pub fn schedule(&mut self, at: f64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let pos = self.tasks.partition_point(|(t, _, _)| *t <= at);
        self.tasks.insert(pos, (at, id, task));
        id
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.tasks.iter().position(|(_, tid, _)| *tid == id) {
            Some(pos) => {
                self.tasks.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<T> {
        let split = self.tasks.partition_point(|(t, _, _)| *t <= now);
        self.tasks.drain(..split).map(|(_, _, task)| task).collect()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.first().map(|(t, _, _)| *t)
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|(_, tid, _)| *tid == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
