//! Scheduler - the single control loop of the daemon
//!
//! Each tick:
//! 1. reap exited workers of every queue
//! 2. admit pending jobs up to each queue's `max_workers`, in registration order
//! 3. wait, bounded by the poll interval, for shutdown or one connection, and
//!    handle that connection inline
//!
//! The registry is owned by the scheduler and mutated only from this loop, so
//! no locking is needed. Real concurrency exists only between OS processes.

use crate::application::protocol::{self, RequestError};
use crate::application::worker::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_READ_TIMEOUT, MAX_REQUEST_BYTES,
};
use crate::application::worker::{Reaper, ShutdownToken, WorkerSpawner};
use crate::domain::{QueueRegistry, QueueStats};
use crate::port::{ProcessLauncher, RequestListener, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

/// Scheduler timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub read_timeout: Duration,
}

impl SchedulerConfig {
    /// Build a config; the read timeout is clamped to the poll interval
    pub fn new(poll_interval: Duration, read_timeout: Duration) -> Self {
        Self {
            poll_interval,
            read_timeout: read_timeout.min(poll_interval),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_READ_TIMEOUT)
    }
}

/// What the wait phase produced
enum WaitEvent<C> {
    Shutdown,
    Idle,
    Closed,
    Connection(C),
    AcceptFailed(std::io::Error),
}

/// Per-tick admission summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub reaped: usize,
    pub spawned: usize,
}

/// Scheduler owns the queue registry and drives reaping, admission and
/// request intake from one task.
pub struct Scheduler {
    registry: QueueRegistry,
    spawner: WorkerSpawner,
    reaper: Reaper,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        registry: QueueRegistry,
        launcher: Arc<dyn ProcessLauncher>,
        time_provider: Arc<dyn TimeProvider>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            spawner: WorkerSpawner::new(launcher, Arc::clone(&time_provider)),
            reaper: Reaper::new(time_provider),
            config,
        }
    }

    pub fn registry(&self) -> &QueueRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut QueueRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> QueueRegistry {
        self.registry
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Reap phase: drop exited workers from every queue
    pub fn reap_phase(&mut self) -> usize {
        self.registry
            .iter_mut()
            .map(|queue| self.reaper.reap_all(queue))
            .sum()
    }

    /// Admit phase: greedy, per queue, in registration order
    pub fn admit_phase(&mut self) -> usize {
        let mut spawned = 0;
        for queue in self.registry.iter_mut() {
            while queue.has_capacity() && queue.pending_count() > 0 {
                if let Some(handle) = self.spawner.spawn(queue) {
                    queue.track(handle);
                    spawned += 1;
                }
            }
        }
        spawned
    }

    /// Reap then admit, without waiting
    pub fn tick(&mut self) -> TickReport {
        let reaped = self.reap_phase();
        let spawned = self.admit_phase();
        if reaped > 0 || spawned > 0 {
            debug!(reaped = reaped, spawned = spawned, "Tick");
        }
        for stats in self.registry.stats() {
            trace!(
                queue = %stats.name,
                pending = stats.pending,
                running = stats.running,
                max_workers = stats.max_workers,
                "Queue state"
            );
        }
        TickReport { reaped, spawned }
    }

    /// Parse and file one raw request. Rejections are logged here and returned.
    pub fn handle_request(&mut self, buf: &[u8]) -> Result<(), RequestError> {
        match protocol::handle_request(&mut self.registry, buf) {
            Ok(request) => {
                info!(queue = %request.queue, args = %request.args, "Job enqueued");
                Ok(())
            }
            Err(e) => {
                let raw = String::from_utf8_lossy(buf);
                warn!(
                    error = %e,
                    request = %raw.trim_end(),
                    "Request rejected"
                );
                Err(e)
            }
        }
    }

    async fn handle_connection<L: RequestListener>(
        &mut self,
        listener: &mut L,
        mut conn: L::Connection,
    ) {
        let read = timeout(
            self.config.read_timeout,
            listener.read_request(&mut conn, MAX_REQUEST_BYTES),
        )
        .await;
        // One attempt per connection; dropping it closes the socket
        drop(conn);

        match read {
            Ok(Ok(buf)) => {
                let _ = self.handle_request(&buf);
            }
            Ok(Err(e)) => warn!(error = %e, "Unable to read request"),
            Err(_) => warn!(
                timeout_ms = self.config.read_timeout.as_millis() as u64,
                "Request read timed out, connection dropped"
            ),
        }
    }

    /// Run the control loop until shutdown is requested or the listener closes.
    ///
    /// The listener is dropped (closing the socket) and exited workers are
    /// reaped one last time before the shutdown cleanup pass. Returns the
    /// queues that could not be removed because they still had pending jobs
    /// or running workers.
    pub async fn run<L: RequestListener>(
        &mut self,
        mut listener: L,
        mut shutdown: ShutdownToken,
    ) -> Vec<QueueStats> {
        info!(
            queues = self.registry.len(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            read_timeout_ms = self.config.read_timeout.as_millis() as u64,
            "Scheduler started"
        );

        while !shutdown.is_shutdown() {
            self.tick();

            let event = tokio::select! {
                _ = shutdown.wait() => WaitEvent::Shutdown,
                accepted = timeout(self.config.poll_interval, listener.accept()) => match accepted {
                    Err(_) => WaitEvent::Idle,
                    Ok(Ok(Some(conn))) => WaitEvent::Connection(conn),
                    Ok(Ok(None)) => WaitEvent::Closed,
                    Ok(Err(e)) => WaitEvent::AcceptFailed(e),
                },
            };

            match event {
                WaitEvent::Shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                WaitEvent::Closed => {
                    info!("Listener closed");
                    break;
                }
                WaitEvent::Idle => {}
                WaitEvent::Connection(conn) => self.handle_connection(&mut listener, conn).await,
                WaitEvent::AcceptFailed(e) => error!(error = %e, "Cannot accept request"),
            }
        }

        drop(listener);
        // Workers that already exited must not keep their queue alive
        self.reap_phase();
        self.shutdown_cleanup()
    }

    /// Remove idle queues; report and keep the rest
    pub fn shutdown_cleanup(&mut self) -> Vec<QueueStats> {
        let retained = self.registry.cleanup();
        info!(
            retained = retained.len(),
            remaining_queues = self.registry.len(),
            "Shutdown cleanup finished"
        );
        retained
    }

    /// Best-effort SIGHUP to every still-tracked worker. Returns how many were signalled.
    pub fn hangup_workers(&mut self) -> usize {
        let mut signalled = 0;
        for queue in self.registry.iter_mut() {
            let name = queue.name().to_string();
            for worker in queue.running_mut() {
                let (id, pid) = (worker.id(), worker.pid());
                match worker.process_mut().hangup() {
                    Ok(()) => signalled += 1,
                    Err(e) => warn!(
                        queue = %name,
                        worker_id = %id,
                        pid = ?pid,
                        error = %e,
                        "Unable to hang up worker"
                    ),
                }
            }
        }
        signalled
    }
}
