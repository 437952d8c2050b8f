// Port Layer - Interfaces for external dependencies

pub mod process_launcher;
pub mod request_listener;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use process_launcher::{ProcessLauncher, SpawnError, WorkerProcess};
pub use request_listener::RequestListener;
pub use time_provider::TimeProvider;
