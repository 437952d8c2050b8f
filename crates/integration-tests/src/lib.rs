//! Shared harness for end-to-end tests
//!
//! Runs a real [`Scheduler`] on a loopback [`TcpRequestListener`] with
//! [`TokioProcessLauncher`] children. Workers are small shell scripts that
//! append `start <arg>` / `end <arg>` lines to a log next to themselves.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ewd_core::application::{shutdown_channel, Scheduler, SchedulerConfig, ShutdownSender};
use ewd_core::domain::{QueueConfig, QueueRegistry, QueueStats};
use ewd_core::port::time_provider::SystemTimeProvider;
use ewd_infra_system::{TcpRequestListener, TokioProcessLauncher};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

pub const LOG_FILE: &str = "jobs.log";

/// Scratch directory holding worker scripts and their shared log
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable worker that logs its argument around a sleep
    pub fn worker_script(&self, name: &str, runtime: Duration) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        let body = format!(
            "#!/bin/sh\n\
             log=\"$(dirname \"$0\")/{LOG_FILE}\"\n\
             echo \"start $1\" >> \"$log\"\n\
             sleep {:.3}\n\
             echo \"end $1\" >> \"$log\"\n",
            runtime.as_secs_f64()
        );
        fs::write(&path, body)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }

    /// Lines written by workers so far
    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join(LOG_FILE))
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Poll the log until `line` shows up; false on timeout
    pub async fn wait_for_line(&self, line: &str, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.log_lines().iter().any(|l| l == line) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// A scheduler running on its own task
pub struct Daemon {
    addr: SocketAddr,
    shutdown: ShutdownSender,
    handle: JoinHandle<(Scheduler, Vec<QueueStats>)>,
}

impl Daemon {
    /// Start with a short poll interval so tests finish quickly
    pub async fn start(queues: Vec<QueueConfig>) -> io::Result<Self> {
        Self::start_with(
            queues,
            SchedulerConfig::new(Duration::from_millis(50), Duration::from_millis(200)),
        )
        .await
    }

    pub async fn start_with(queues: Vec<QueueConfig>, config: SchedulerConfig) -> io::Result<Self> {
        let mut registry = QueueRegistry::new();
        for queue in queues {
            registry
                .install(queue)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        }

        let listener = TcpRequestListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .map_err(io::Error::other)?;
        let addr = listener.local_addr();

        let (shutdown, token) = shutdown_channel();
        let mut scheduler = Scheduler::new(
            registry,
            Arc::new(TokioProcessLauncher::new()),
            Arc::new(SystemTimeProvider),
            config,
        );

        let handle = tokio::spawn(async move {
            let retained = scheduler.run(listener, token).await;
            (scheduler, retained)
        });

        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connect, send `payload` and close the write side
    pub async fn submit(&self, payload: &[u8]) -> io::Result<()> {
        let mut stream = TcpStream::connect(self.addr).await?;
        stream.write_all(payload).await?;
        stream.shutdown().await
    }

    /// Request shutdown and wait for the loop to finish
    pub async fn stop(self) -> io::Result<(Scheduler, Vec<QueueStats>)> {
        self.shutdown.shutdown();
        self.handle.await.map_err(io::Error::other)
    }
}
