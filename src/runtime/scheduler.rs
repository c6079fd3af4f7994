use crate::runtime::event::TimerEvent;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    EmitNow(TimerEvent),
    /// Replaces any pending task under `key`; only the last one fires.
    Debounce {
        key: String,
        delay: Duration,
        event: TimerEvent,
    },
    Cancel {
        key: String,
    },
}

#[derive(Debug, Clone)]
struct Guard {
    key: String,
    version: u64,
}

#[derive(Debug, Clone)]
struct DelayedTask {
    due_at: Instant,
    guard: Guard,
    event: TimerEvent,
}

#[derive(Default)]
pub struct Scheduler {
    ready: VecDeque<TimerEvent>,
    delayed: Vec<DelayedTask>,
    key_versions: HashMap<String, u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, command: SchedulerCommand, now: Instant) {
        match command {
            SchedulerCommand::EmitNow(event) => {
                self.ready.push_back(event);
            }
            SchedulerCommand::Debounce { key, delay, event } => {
                let version = self.bump_version(&key);
                self.purge(&key);
                self.delayed.push(DelayedTask {
                    due_at: now + delay,
                    guard: Guard { key, version },
                    event,
                });
            }
            SchedulerCommand::Cancel { key } => {
                self.bump_version(&key);
                self.purge(&key);
            }
        }
    }

    pub fn drain_ready(&mut self, now: Instant) -> Vec<TimerEvent> {
        self.delayed.sort_by_key(|task| task.due_at);
        let mut idx = 0usize;
        while idx < self.delayed.len() {
            if self.delayed[idx].due_at <= now {
                let task = self.delayed.remove(idx);
                if self.task_is_valid(&task) {
                    self.ready.push_back(task.event);
                }
            } else {
                idx += 1;
            }
        }

        self.ready.drain(..).collect()
    }

    pub fn poll_timeout(&self, now: Instant, default_timeout: Duration) -> Duration {
        let mut next = default_timeout;

        for task in &self.delayed {
            let due_in = task.due_at.saturating_duration_since(now);
            if due_in < next {
                next = due_in;
            }
        }

        next
    }

    pub fn pending(&self) -> usize {
        self.delayed.len() + self.ready.len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.delayed.iter().any(|task| task.guard.key == key)
    }

    pub fn clear(&mut self) {
        let keys = self
            .delayed
            .iter()
            .map(|task| task.guard.key.clone())
            .collect::<Vec<_>>();
        for key in keys {
            self.bump_version(&key);
        }
        self.delayed.clear();
        self.ready.clear();
    }

    fn purge(&mut self, key: &str) {
        self.delayed.retain(|task| task.guard.key != key);
    }

    fn task_is_valid(&self, task: &DelayedTask) -> bool {
        let current = *self.key_versions.get(&task.guard.key).unwrap_or(&0);
        current == task.guard.version
    }

    fn bump_version(&mut self, key: &str) -> u64 {
        let entry = self.key_versions.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }
}
