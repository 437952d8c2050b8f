// Reaper - non-blocking exit detection for tracked workers

use crate::domain::Queue;
use crate::port::TimeProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconciles a queue's running set with the processes that actually exited.
pub struct Reaper {
    time_provider: Arc<dyn TimeProvider>,
}

impl Reaper {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Remove every exited worker from `queue`'s running set.
    ///
    /// Never waits on a live process. Exit status is logged only. A worker
    /// whose exit check fails is dropped as well, so its slot cannot leak.
    /// Returns how many workers were removed.
    pub fn reap_all(&self, queue: &mut Queue) -> usize {
        let mut reaped = 0;

        for id in queue.running_ids() {
            let Some(worker) = queue.worker_mut(id) else {
                continue;
            };

            match worker.process_mut().try_exit() {
                Ok(None) => {}
                Ok(Some(exit)) => {
                    let runtime_ms = self.time_provider.now_millis() - worker.started_at();
                    if exit.success() {
                        info!(
                            queue = %queue.name(),
                            worker_id = %id,
                            runtime_ms = runtime_ms,
                            "Worker finished"
                        );
                    } else {
                        info!(
                            queue = %queue.name(),
                            worker_id = %id,
                            exit_code = ?exit.code,
                            runtime_ms = runtime_ms,
                            "Worker finished with failure status"
                        );
                    }
                    queue.untrack(id);
                    reaped += 1;
                }
                Err(e) => {
                    let pid = worker.pid();
                    warn!(
                        queue = %queue.name(),
                        worker_id = %id,
                        pid = ?pid,
                        error = %e,
                        "Exit check failed, dropping worker from running set"
                    );
                    queue.untrack(id);
                    reaped += 1;
                }
            }
        }

        if reaped > 0 {
            debug!(
                queue = %queue.name(),
                reaped = reaped,
                running = queue.running_count(),
                "Reaped workers"
            );
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::worker::WorkerSpawner;
    use crate::domain::{Job, QueueConfig};
    use crate::port::process_launcher::mocks::MockProcessLauncher;
    use crate::port::time_provider::mocks::MockTimeProvider;

    fn queue_with_running(launcher: &MockProcessLauncher, jobs: &[&str]) -> Queue {
        let time = Arc::new(MockTimeProvider::new(0));
        let mut spawner = WorkerSpawner::new(Arc::new(launcher.clone()), time);
        let mut queue = Queue::new(QueueConfig::new("q", jobs.len(), "/bin/true"));
        for job in jobs {
            queue.enqueue(Job::new(*job)).unwrap();
        }
        while let Some(handle) = spawner.spawn(&mut queue) {
            queue.track(handle);
        }
        queue
    }

    #[test]
    fn test_reap_leaves_live_workers() {
        let launcher = MockProcessLauncher::new();
        let mut queue = queue_with_running(&launcher, &["a", "b"]);
        let reaper = Reaper::new(Arc::new(MockTimeProvider::new(10)));

        assert_eq!(reaper.reap_all(&mut queue), 0);
        assert_eq!(queue.running_count(), 2);
    }

    #[test]
    fn test_reap_removes_only_exited_workers() {
        let launcher = MockProcessLauncher::new();
        let mut queue = queue_with_running(&launcher, &["a", "b", "c"]);
        let reaper = Reaper::new(Arc::new(MockTimeProvider::new(10)));

        launcher.finish("b", 0);
        launcher.finish("c", 3); // failure status is not special

        assert_eq!(reaper.reap_all(&mut queue), 2);
        assert_eq!(queue.running_count(), 1);

        let remaining: Vec<String> = queue.running_mut().map(|w| w.args().to_string()).collect();
        assert_eq!(remaining, vec!["a".to_string()]);

        // Already reaped workers are not counted twice
        assert_eq!(reaper.reap_all(&mut queue), 0);
    }

    #[test]
    fn test_reap_drops_worker_when_exit_check_fails() {
        let launcher = MockProcessLauncher::new();
        let mut queue = queue_with_running(&launcher, &["a"]);
        let reaper = Reaper::new(Arc::new(MockTimeProvider::new(10)));

        launcher.break_wait("a");

        assert_eq!(reaper.reap_all(&mut queue), 1);
        assert_eq!(queue.running_count(), 0);
        assert!(queue.has_capacity());
    }
}
