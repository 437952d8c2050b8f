// Queue Domain Model

use std::collections::BTreeMap;

use crate::domain::error::Result;
use crate::domain::job::{Job, JobQueue};
use crate::domain::worker::{WorkerHandle, WorkerId};

/// Queue identifier
pub type QueueId = String;

/// Static queue definition, as loaded from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub name: QueueId,
    pub max_workers: usize,
    /// Executable invoked as `command <job args>`
    pub command: String,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, max_workers: usize, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_workers,
            command: command.into(),
        }
    }
}

/// Point-in-time counters for one queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    pub name: QueueId,
    pub pending: usize,
    pub running: usize,
    pub max_workers: usize,
}

/// A named queue: its definition, pending jobs and running workers.
///
/// Invariant: `running_count() <= max_workers()`. The queue does not police
/// this on its own; the scheduler checks [`Queue::has_capacity`] before every
/// admission and is the only caller of [`Queue::track`].
#[derive(Debug)]
pub struct Queue {
    config: QueueConfig,
    pending: JobQueue,
    running: BTreeMap<WorkerId, WorkerHandle>,
}

impl Queue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            pending: JobQueue::new(),
            running: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn command(&self) -> &str {
        &self.config.command
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn enqueue(&mut self, job: Job) -> Result<()> {
        self.pending.enqueue(job)
    }

    pub fn dequeue(&mut self) -> Option<Job> {
        self.pending.dequeue()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// True while another worker may be admitted
    pub fn has_capacity(&self) -> bool {
        self.running.len() < self.config.max_workers
    }

    /// Nothing pending and nothing running
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }

    /// Record a freshly spawned worker in the running set.
    pub fn track(&mut self, handle: WorkerHandle) {
        debug_assert!(self.has_capacity(), "admission past max_workers");
        self.running.insert(handle.id(), handle);
    }

    /// Drop a worker from the running set, returning its handle if it was tracked.
    pub fn untrack(&mut self, id: WorkerId) -> Option<WorkerHandle> {
        self.running.remove(&id)
    }

    pub fn running_ids(&self) -> Vec<WorkerId> {
        self.running.keys().copied().collect()
    }

    pub fn running_mut(&mut self) -> impl Iterator<Item = &mut WorkerHandle> {
        self.running.values_mut()
    }

    pub fn worker_mut(&mut self, id: WorkerId) -> Option<&mut WorkerHandle> {
        self.running.get_mut(&id)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            name: self.config.name.clone(),
            pending: self.pending_count(),
            running: self.running_count(),
            max_workers: self.config.max_workers,
        }
    }
}
