// Application Layer - Request intake, worker lifecycle and the control loop

pub mod protocol;
pub mod scheduler;
pub mod worker;

// Re-exports
pub use protocol::{parse_request, Request, RequestError};
pub use scheduler::{Scheduler, SchedulerConfig, TickReport};
pub use worker::{shutdown_channel, Reaper, ShutdownSender, ShutdownToken, WorkerSpawner};
