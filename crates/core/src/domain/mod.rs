// Domain Layer - Queues, jobs and running workers

pub mod error;
pub mod job;
pub mod queue;
pub mod registry;
pub mod worker;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobQueue};
pub use queue::{Queue, QueueConfig, QueueId, QueueStats};
pub use registry::{QueueRegistry, RemovalOutcome};
pub use worker::{WorkerExit, WorkerHandle, WorkerId};
