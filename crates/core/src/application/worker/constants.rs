// Scheduler constants (no magic values)
use std::time::Duration;

/// Upper bound on the wait phase of one tick (2.5s)
/// Bounds the latency between a worker exiting and its slot being reused.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Upper bound on reading a single request from an accepted connection (1s)
/// Never larger than the poll interval.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest accepted request, including the trailing newline
pub const MAX_REQUEST_BYTES: usize = 1024;
