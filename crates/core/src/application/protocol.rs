//! Request Protocol
//!
//! Wire format, one request per connection, no response:
//!
//! ```text
//! <queue-name><SP|TAB>+<argument-string>\n
//! ```
//!
//! The argument string is everything up to the first newline and is handed to
//! the queue's command unsplit.

use crate::application::worker::constants::MAX_REQUEST_BYTES;
use crate::domain::{DomainError, Job, QueueRegistry};
use thiserror::Error;

/// Per-request errors; all are logged and the request discarded
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Request too large: {len} bytes (max {max})")]
    TooLarge { len: usize, max: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// A parsed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub queue: String,
    pub args: String,
}

fn is_field_delimiter(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Parse one raw request buffer.
///
/// Bytes after the first newline are ignored. One trailing `\r` before the
/// newline is stripped so line-mode clients work.
pub fn parse_request(buf: &[u8]) -> Result<Request, RequestError> {
    if buf.len() > MAX_REQUEST_BYTES {
        return Err(RequestError::TooLarge {
            len: buf.len(),
            max: MAX_REQUEST_BYTES,
        });
    }

    let delim = buf
        .iter()
        .position(|b| is_field_delimiter(*b))
        .ok_or_else(|| RequestError::Malformed("missing queue name delimiter".to_string()))?;

    let name = &buf[..delim];
    if name.is_empty() {
        return Err(RequestError::Malformed("empty queue name".to_string()));
    }

    let rest_start = buf[delim..]
        .iter()
        .position(|b| !is_field_delimiter(*b))
        .map_or(buf.len(), |offset| delim + offset);
    let rest = &buf[rest_start..];

    let newline = rest
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| RequestError::Malformed("missing terminating newline".to_string()))?;

    let mut args = &rest[..newline];
    if let Some(stripped) = args.strip_suffix(b"\r") {
        args = stripped;
    }

    let queue = std::str::from_utf8(name)
        .map_err(|_| RequestError::Malformed("queue name is not valid UTF-8".to_string()))?;
    let args = std::str::from_utf8(args)
        .map_err(|_| RequestError::Malformed("arguments are not valid UTF-8".to_string()))?;

    Ok(Request {
        queue: queue.to_string(),
        args: args.to_string(),
    })
}

/// File a parsed request into its queue.
///
/// # Errors
/// - `DomainError::UnknownQueue` if no such queue is registered; nothing is enqueued
/// - `DomainError::Allocation` if the queue cannot grow; the job is dropped
pub fn submit(registry: &mut QueueRegistry, request: Request) -> Result<(), RequestError> {
    let queue = registry
        .lookup_mut(&request.queue)
        .ok_or_else(|| DomainError::UnknownQueue(request.queue.clone()))?;
    queue.enqueue(Job::new(request.args))?;
    Ok(())
}

/// Parse and submit in one step, returning the accepted request
pub fn handle_request(registry: &mut QueueRegistry, buf: &[u8]) -> Result<Request, RequestError> {
    let request = parse_request(buf)?;
    submit(registry, request.clone())?;
    Ok(request)
}
