// Running Worker Model

use std::fmt;

use crate::port::WorkerProcess;

/// Daemon-unique worker identifier.
///
/// Assigned monotonically by the spawner and never reused, so a recycled OS
/// pid can never alias a worker that is still being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// How a worker process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerExit {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl WorkerExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A live worker process owned by a queue until it is reaped.
pub struct WorkerHandle {
    id: WorkerId,
    args: String,
    started_at: i64, // epoch ms
    process: Box<dyn WorkerProcess>,
}

impl WorkerHandle {
    pub fn new(
        id: WorkerId,
        args: impl Into<String>,
        started_at: i64,
        process: Box<dyn WorkerProcess>,
    ) -> Self {
        Self {
            id,
            args: args.into(),
            started_at,
            process,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Argument string of the job this worker is executing
    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// OS process id, informational only
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    pub fn process_mut(&mut self) -> &mut dyn WorkerProcess {
        self.process.as_mut()
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("pid", &self.pid())
            .field("args", &self.args)
            .field("started_at", &self.started_at)
            .finish()
    }
}
