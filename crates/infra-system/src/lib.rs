// EWD Infrastructure - System Adapters
// Implements: ProcessLauncher, RequestListener

pub mod process_launcher;
pub mod tcp_listener;

pub use process_launcher::{ChildProcess, TokioProcessLauncher};
pub use tcp_listener::TcpRequestListener;
