// Job Domain Model

use std::collections::VecDeque;

use crate::domain::error::{DomainError, Result};

/// One pending unit of work: the opaque argument string handed to a queue's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    args: String,
}

impl Job {
    pub fn new(args: impl Into<String>) -> Self {
        Self { args: args.into() }
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn into_args(self) -> String {
        self.args
    }
}

/// FIFO of pending jobs for a single queue.
///
/// Ordering is strictly first-in, first-out. There is no priority and no
/// reordering; a job leaves the queue only through [`JobQueue::dequeue`].
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the tail.
    ///
    /// # Errors
    /// - `DomainError::Allocation` if the backing storage cannot grow; the job is dropped
    pub fn enqueue(&mut self, job: Job) -> Result<()> {
        self.jobs
            .try_reserve(1)
            .map_err(|e| DomainError::Allocation(e.to_string()))?;
        self.jobs.push_back(job);
        Ok(())
    }

    /// Remove and return the head, or `None` when nothing is pending.
    pub fn dequeue(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
