/// Deferred work a skater runs at a later simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Turn ground and rail probes back on after leaving a grind
    RestoreCollision,
}

/// Per-skater "run after N seconds" queue, polled at the start of each physics tick.
///
/// Tasks due at the same time run in the order they were scheduled.
#[derive(Debug, Default, Clone)]
pub struct Scheduler {
    pending: Vec<(f64, ScheduledTask)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: f64, delay: f64, task: ScheduledTask) {
        self.pending.push((now + delay.max(0.0), task));
    }

    /// Removes and returns every task due at or before `now`.
    pub fn poll(&mut self, now: f64) -> Vec<ScheduledTask> {
        let mut due: Vec<(f64, ScheduledTask)> = Vec::new();
        self.pending.retain(|&(at, task)| {
            if at <= now {
                due.push((at, task));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, task)| task).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
