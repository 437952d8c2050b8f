// Queue Registry

use tracing::warn;

use crate::domain::error::{DomainError, Result};
use crate::domain::queue::{Queue, QueueConfig, QueueStats};

/// Outcome of a removal attempt at shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Retained { pending: usize, running: usize },
    NotFound,
}

/// Ordered set of uniquely named queues.
///
/// Registration order is preserved; the scheduler admits queues in that order
/// on every tick. Built once at startup and shrunk only by [`QueueRegistry::cleanup`].
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: Vec<Queue>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queue.
    ///
    /// # Errors
    /// - `DomainError::DuplicateQueue` if the name is taken; the first definition is kept
    pub fn install(&mut self, config: QueueConfig) -> Result<()> {
        if self.lookup(&config.name).is_some() {
            return Err(DomainError::DuplicateQueue(config.name));
        }
        self.queues.push(Queue::new(config));
        Ok(())
    }

    /// Exact-name lookup
    pub fn lookup(&self, name: &str) -> Option<&Queue> {
        self.queues.iter().find(|q| q.name() == name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Queue> {
        self.queues.iter_mut().find(|q| q.name() == name)
    }

    /// Remove the queue iff it has no pending jobs and no running workers
    pub fn remove_if_empty(&mut self, name: &str) -> RemovalOutcome {
        let Some(index) = self.queues.iter().position(|q| q.name() == name) else {
            return RemovalOutcome::NotFound;
        };

        let queue = &self.queues[index];
        if queue.is_idle() {
            self.queues.remove(index);
            RemovalOutcome::Removed
        } else {
            RemovalOutcome::Retained {
                pending: queue.pending_count(),
                running: queue.running_count(),
            }
        }
    }

    /// Shutdown pass: drop every idle queue, report and keep the rest.
    ///
    /// Returns the stats of the queues that could not be removed.
    pub fn cleanup(&mut self) -> Vec<QueueStats> {
        let names: Vec<String> = self.queues.iter().map(|q| q.name().to_string()).collect();
        let mut retained = Vec::new();

        for name in names {
            if let RemovalOutcome::Retained { pending, running } = self.remove_if_empty(&name) {
                warn!(
                    queue = %name,
                    pending = pending,
                    running = running,
                    "Unable to remove queue: work still outstanding"
                );
                if let Some(queue) = self.lookup(&name) {
                    retained.push(queue.stats());
                }
            }
        }

        retained
    }

    pub fn iter(&self) -> impl Iterator<Item = &Queue> {
        self.queues.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Queue> {
        self.queues.iter_mut()
    }

    pub fn stats(&self) -> Vec<QueueStats> {
        self.queues.iter().map(Queue::stats).collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
