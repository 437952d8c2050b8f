//! Queue definition file
//!
//! One queue per line: `name maxworkers command`, fields separated by spaces
//! or tabs. The command is the remainder of the line. Blank lines and lines
//! starting with `#` are skipped. Loading stops at the first malformed line;
//! queues defined above it stay installed.

use ewd_core::domain::{QueueConfig, QueueRegistry};
use ewd_core::error::{AppError, Result};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineError {
    #[error("missing `maxworkers` field")]
    MissingMaxWorkers,

    #[error("invalid `maxworkers` value: {0:?}")]
    InvalidMaxWorkers(String),

    #[error("missing `cmd` field")]
    MissingCommand,
}

/// Result of parsing a whole file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedQueues {
    pub queues: Vec<QueueConfig>,
    /// First malformed line (1-based) and why; nothing after it was read
    pub error: Option<(usize, LineError)>,
}

fn split_field(s: &str) -> Option<(&str, &str)> {
    let (field, rest) = s.split_once([' ', '\t'])?;
    Some((field, rest.trim_start_matches([' ', '\t'])))
}

/// Parse one line; `Ok(None)` for blank lines and comments
pub fn parse_line(line: &str) -> std::result::Result<Option<QueueConfig>, LineError> {
    let line = line.trim_end_matches(['\n', '\r']).trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, rest) = split_field(line).ok_or(LineError::MissingMaxWorkers)?;
    let (max, command) = split_field(rest).ok_or(LineError::MissingCommand)?;

    let max_workers = max
        .parse::<usize>()
        .map_err(|_| LineError::InvalidMaxWorkers(max.to_string()))?;

    let command = command.trim();
    if command.is_empty() {
        return Err(LineError::MissingCommand);
    }

    Ok(Some(QueueConfig::new(name, max_workers, command)))
}

pub fn parse_queue_defs(content: &str) -> ParsedQueues {
    let mut parsed = ParsedQueues::default();

    for (index, line) in content.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(def)) => parsed.queues.push(def),
            Ok(None) => {}
            Err(e) => {
                parsed.error = Some((index + 1, e));
                break;
            }
        }
    }

    parsed
}

/// Install parsed definitions; duplicates are reported and skipped
pub fn build_registry(defs: Vec<QueueConfig>) -> QueueRegistry {
    let mut registry = QueueRegistry::new();

    for def in defs {
        let (name, max_workers) = (def.name.clone(), def.max_workers);
        let command = def.command.clone();
        match registry.install(def) {
            Ok(()) => info!(
                queue = %name,
                max_workers = max_workers,
                command = %command,
                "Queue registered"
            ),
            Err(e) => error!(queue = %name, error = %e, "Queue definition rejected"),
        }
    }

    registry
}

/// Read the queue file and build the registry.
///
/// # Errors
/// - AppError::Config if no queue could be registered
pub fn load_registry(path: &Path) -> Result<QueueRegistry> {
    let parsed = match std::fs::read_to_string(path) {
        Ok(content) => parse_queue_defs(&content),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Unable to open queue config");
            ParsedQueues::default()
        }
    };

    if let Some((line, e)) = &parsed.error {
        error!(
            path = %path.display(),
            line = *line,
            error = %e,
            "Unable to load queues, stopped at malformed line"
        );
    }

    let registry = build_registry(parsed.queues);
    if registry.is_empty() {
        return Err(AppError::Config(format!(
            "no queues registered from {}",
            path.display()
        )));
    }
    Ok(registry)
}
