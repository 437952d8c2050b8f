// Process launcher implementation
// reason: tokio::process so exit polling and orphan reaping integrate with the runtime
use std::io;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

use ewd_core::domain::WorkerExit;
use ewd_core::port::process_launcher::{ProcessLauncher, SpawnError, WorkerProcess};

/// Process launcher backed by `tokio::process`
///
/// Each job runs as `command <args>`: exactly one positional argument, stdin
/// closed, stdout/stderr inherited from the daemon. Children are never killed
/// on drop.
#[derive(Debug, Default, Clone)]
pub struct TokioProcessLauncher;

impl TokioProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    fn map_spawn_error(command: &str, err: io::Error) -> SpawnError {
        match err.kind() {
            io::ErrorKind::NotFound => SpawnError::NotFound(command.to_string()),
            io::ErrorKind::PermissionDenied => SpawnError::PermissionDenied(command.to_string()),
            _ => SpawnError::Failed {
                command: command.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

impl ProcessLauncher for TokioProcessLauncher {
    fn launch(&self, command: &str, arg: &str) -> Result<Box<dyn WorkerProcess>, SpawnError> {
        let child = Command::new(command)
            .arg(arg)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| Self::map_spawn_error(command, e))?;

        let pid = child.id();
        debug!(command = %command, pid = ?pid, "Spawned child process");

        Ok(Box::new(ChildProcess { child, pid }))
    }
}

/// Running child process
pub struct ChildProcess {
    child: Child,
    // Cached: tokio forgets the id once the child has been reaped
    pid: Option<u32>,
}

impl WorkerProcess for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn try_exit(&mut self) -> io::Result<Option<WorkerExit>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| WorkerExit { code: status.code() }))
    }

    fn hangup(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = self
                .pid
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "process id unknown"))?;
            let pid = i32::try_from(pid)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

            kill(Pid::from_raw(pid), Signal::SIGHUP).map_err(io::Error::from)
        }

        #[cfg(not(unix))]
        {
            self.child.start_kill()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_ok;

    async fn wait_for_exit(process: &mut Box<dyn WorkerProcess>) -> WorkerExit {
        for _ in 0..200 {
            if let Some(exit) = assert_ok!(process.try_exit()) {
                return exit;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("process did not exit in time");
    }

    #[tokio::test]
    async fn test_launch_reports_success_exit() {
        let launcher = TokioProcessLauncher::new();
        let mut process = assert_ok!(launcher.launch("true", "ignored argument"));

        assert!(process.pid().is_some());
        let exit = wait_for_exit(&mut process).await;
        assert!(exit.success());
    }

    #[tokio::test]
    async fn test_launch_reports_failure_exit() {
        let launcher = TokioProcessLauncher::new();
        let mut process = assert_ok!(launcher.launch("false", "x"));

        let exit = wait_for_exit(&mut process).await;
        assert_eq!(exit.code, Some(1));
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn test_launch_missing_command() {
        let launcher = TokioProcessLauncher::new();
        let result = launcher.launch("/nonexistent/ewd-test-command", "x");

        assert!(matches!(result, Err(SpawnError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_try_exit_does_not_block() {
        let launcher = TokioProcessLauncher::new();
        let mut process = assert_ok!(launcher.launch("sleep", "5"));

        let started = std::time::Instant::now();
        assert!(process.try_exit().unwrap().is_none());
        assert!(started.elapsed() < Duration::from_secs(1));

        // Clean up: SIGHUP terminates sleep
        assert_ok!(process.hangup());
        let exit = wait_for_exit(&mut process).await;
        assert_eq!(exit.code, None, "signal death carries no exit code");
    }
}
