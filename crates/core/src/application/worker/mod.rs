// Worker lifecycle - spawning and reaping

pub mod constants;
mod reaper;
mod shutdown;

pub use reaper::Reaper;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::domain::{Queue, WorkerHandle, WorkerId};
use crate::port::{ProcessLauncher, TimeProvider};
use std::sync::Arc;
use tracing::{error, info};

/// Turns pending jobs into running worker processes.
///
/// The spawner enforces no concurrency limit; callers check
/// [`Queue::has_capacity`] before each call.
pub struct WorkerSpawner {
    launcher: Arc<dyn ProcessLauncher>,
    time_provider: Arc<dyn TimeProvider>,
    next_id: u64,
}

impl WorkerSpawner {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            launcher,
            time_provider,
            next_id: 1,
        }
    }

    /// Dequeue one job from `queue` and start its worker.
    ///
    /// Returns `None` when nothing is pending, or when the launch failed. A
    /// failed launch consumes the job: it is logged and not re-enqueued.
    pub fn spawn(&mut self, queue: &mut Queue) -> Option<WorkerHandle> {
        let job = queue.dequeue()?;
        let args = job.into_args();

        match self.launcher.launch(queue.command(), &args) {
            Ok(process) => {
                let id = WorkerId::new(self.next_id);
                self.next_id += 1;

                info!(
                    queue = %queue.name(),
                    worker_id = %id,
                    pid = ?process.pid(),
                    command = %queue.command(),
                    args = %args,
                    "Worker started"
                );

                Some(WorkerHandle::new(
                    id,
                    args,
                    self.time_provider.now_millis(),
                    process,
                ))
            }
            Err(e) => {
                error!(
                    queue = %queue.name(),
                    command = %queue.command(),
                    args = %args,
                    error = %e,
                    "Unable to spawn worker, job dropped"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Job, QueueConfig};
    use crate::port::process_launcher::mocks::MockProcessLauncher;
    use crate::port::time_provider::mocks::MockTimeProvider;

    fn spawner_with(launcher: &MockProcessLauncher) -> WorkerSpawner {
        WorkerSpawner::new(
            Arc::new(launcher.clone()),
            Arc::new(MockTimeProvider::new(5_000)),
        )
    }

    #[test]
    fn test_spawn_empty_queue_is_noop() {
        let launcher = MockProcessLauncher::new();
        let mut spawner = spawner_with(&launcher);
        let mut queue = Queue::new(QueueConfig::new("build", 1, "/bin/echo"));

        assert!(spawner.spawn(&mut queue).is_none());
        assert!(launcher.launches().is_empty());
        assert!(launcher.failed_attempts().is_empty());
    }

    #[test]
    fn test_spawn_passes_whole_argument_string() {
        let launcher = MockProcessLauncher::new();
        let mut spawner = spawner_with(&launcher);
        let mut queue = Queue::new(QueueConfig::new("build", 1, "/usr/local/bin/builder"));
        queue.enqueue(Job::new("release --target x86_64")).unwrap();

        let handle = spawner.spawn(&mut queue).expect("worker should start");

        let launches = launcher.launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].command, "/usr/local/bin/builder");
        assert_eq!(launches[0].arg, "release --target x86_64");
        assert_eq!(handle.args(), "release --target x86_64");
        assert_eq!(handle.started_at(), 5_000);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_spawn_assigns_unique_ids() {
        let launcher = MockProcessLauncher::new();
        let mut spawner = spawner_with(&launcher);
        let mut queue = Queue::new(QueueConfig::new("build", 3, "/bin/echo"));
        for args in ["a", "b", "c"] {
            queue.enqueue(Job::new(args)).unwrap();
        }

        let ids: Vec<WorkerId> = (0..3)
            .filter_map(|_| spawner.spawn(&mut queue))
            .map(|h| h.id())
            .collect();

        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_spawn_failure_drops_job() {
        let launcher = MockProcessLauncher::new();
        launcher.fail_next(1);
        let mut spawner = spawner_with(&launcher);
        let mut queue = Queue::new(QueueConfig::new("build", 1, "/missing/cmd"));
        queue.enqueue(Job::new("lost")).unwrap();
        queue.enqueue(Job::new("kept")).unwrap();

        assert!(spawner.spawn(&mut queue).is_none());
        assert_eq!(
            launcher.failed_attempts(),
            vec![("/missing/cmd".to_string(), "lost".to_string())]
        );
        // Not re-enqueued: only the second job remains
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.dequeue(), Some(Job::new("kept")));
    }
}
