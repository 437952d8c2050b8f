// Process Launcher Port
// Abstraction for starting worker processes and polling their exit

use crate::domain::WorkerExit;
use thiserror::Error;

/// Process creation errors
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Spawn failed for {command}: {reason}")]
    Failed { command: String, reason: String },
}

/// A started worker process
///
/// Implementations:
/// - ChildProcess (infra-system): wraps `tokio::process::Child`
/// - MockProcess: controllable exit for tests
pub trait WorkerProcess: Send {
    /// OS process id, if still known
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check
    ///
    /// Returns `Ok(None)` while the process is still running. Must never wait.
    fn try_exit(&mut self) -> std::io::Result<Option<WorkerExit>>;

    /// Best-effort SIGHUP delivery
    fn hangup(&mut self) -> std::io::Result<()>;
}

/// Starts worker processes
pub trait ProcessLauncher: Send + Sync {
    /// Start `command` with `arg` as its single positional argument
    ///
    /// # Errors
    /// - SpawnError::NotFound if the executable does not exist
    /// - SpawnError::PermissionDenied if it cannot be executed
    /// - SpawnError::Failed for any other process creation failure
    fn launch(&self, command: &str, arg: &str) -> Result<Box<dyn WorkerProcess>, SpawnError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Record of one launch attempt that produced a process
    #[derive(Debug, Clone)]
    pub struct MockLaunch {
        pub command: String,
        pub arg: String,
        pub pid: u32,
        state: Arc<Mutex<MockProcessState>>,
    }

    #[derive(Debug, Default)]
    struct MockProcessState {
        exit: Option<WorkerExit>,
        wait_error: bool,
        hangups: usize,
    }

    #[derive(Default)]
    struct LauncherState {
        launches: Vec<MockLaunch>,
        failures_remaining: usize,
        failed_attempts: Vec<(String, String)>,
        next_pid: u32,
    }

    /// Mock Process Launcher for testing
    ///
    /// Cheap to clone; clones share the same recorded launches.
    #[derive(Clone, Default)]
    pub struct MockProcessLauncher {
        state: Arc<Mutex<LauncherState>>,
    }

    impl MockProcessLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `n` launches fail with `SpawnError::NotFound`
        pub fn fail_next(&self, n: usize) {
            self.state.lock().unwrap().failures_remaining = n;
        }

        /// Successful launches, in order
        pub fn launches(&self) -> Vec<MockLaunch> {
            self.state.lock().unwrap().launches.clone()
        }

        /// Argument strings of successful launches, in order
        pub fn launched_args(&self) -> Vec<String> {
            self.launches().into_iter().map(|l| l.arg).collect()
        }

        pub fn failed_attempts(&self) -> Vec<(String, String)> {
            self.state.lock().unwrap().failed_attempts.clone()
        }

        /// Processes that have not been told to exit yet
        pub fn alive_count(&self) -> usize {
            self.launches()
                .iter()
                .filter(|l| l.state.lock().unwrap().exit.is_none())
                .count()
        }

        /// Mark the process for the given job argument as exited
        pub fn finish(&self, arg: &str, code: i32) {
            for launch in self.launches().iter().filter(|l| l.arg == arg) {
                launch.state.lock().unwrap().exit = Some(WorkerExit { code: Some(code) });
            }
        }

        /// Mark every launched process as exited with `code`
        pub fn finish_all(&self, code: i32) {
            for launch in self.launches() {
                launch.state.lock().unwrap().exit = Some(WorkerExit { code: Some(code) });
            }
        }

        /// Make the exit check of the given job's process fail
        pub fn break_wait(&self, arg: &str) {
            for launch in self.launches().iter().filter(|l| l.arg == arg) {
                launch.state.lock().unwrap().wait_error = true;
            }
        }

        /// Total SIGHUPs delivered across all processes
        pub fn hangup_count(&self) -> usize {
            self.launches()
                .iter()
                .map(|l| l.state.lock().unwrap().hangups)
                .sum()
        }
    }

    impl ProcessLauncher for MockProcessLauncher {
        fn launch(&self, command: &str, arg: &str) -> Result<Box<dyn WorkerProcess>, SpawnError> {
            let mut state = self.state.lock().unwrap();

            if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                state
                    .failed_attempts
                    .push((command.to_string(), arg.to_string()));
                return Err(SpawnError::NotFound(command.to_string()));
            }

            state.next_pid += 1;
            let process_state = Arc::new(Mutex::new(MockProcessState::default()));
            let launch = MockLaunch {
                command: command.to_string(),
                arg: arg.to_string(),
                pid: 1000 + state.next_pid,
                state: Arc::clone(&process_state),
            };
            let pid = launch.pid;
            state.launches.push(launch);

            Ok(Box::new(MockProcess {
                pid,
                state: process_state,
            }))
        }
    }

    /// Mock worker process driven by [`MockProcessLauncher`]
    pub struct MockProcess {
        pid: u32,
        state: Arc<Mutex<MockProcessState>>,
    }

    impl WorkerProcess for MockProcess {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn try_exit(&mut self) -> std::io::Result<Option<WorkerExit>> {
            let state = self.state.lock().unwrap();
            if state.wait_error {
                return Err(std::io::Error::other("mock wait failure"));
            }
            Ok(state.exit)
        }

        fn hangup(&mut self) -> std::io::Result<()> {
            self.state.lock().unwrap().hangups += 1;
            Ok(())
        }
    }
}
