//! Daemon configuration from command-line flags and environment

use clap::{Parser, ValueEnum};
use ewd_core::application::SchedulerConfig;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "/etc/ewd.conf";
const DEFAULT_PORT: u16 = 8277;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2500;
const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "ewd")]
#[command(about = "Lightweight job-dispatch daemon", long_about = None)]
#[command(version)]
pub struct DaemonConfig {
    /// Queue definition file
    #[arg(short, long, env = "EWD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// TCP port to accept submissions on
    #[arg(short, long, env = "EWD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "EWD_BIND", default_value = DEFAULT_BIND)]
    pub bind: IpAddr,

    /// Upper bound on one scheduler wait, in milliseconds
    #[arg(
        long,
        env = "EWD_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Upper bound on reading one request, in milliseconds (capped at the poll interval)
    #[arg(
        long,
        env = "EWD_READ_TIMEOUT_MS",
        default_value_t = DEFAULT_READ_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_timeout_ms: u64,

    /// Log output format
    #[arg(long, env = "EWD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write daily-rotated log files into this directory
    #[arg(long, env = "EWD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Send SIGHUP to workers still running at exit
    #[arg(long, env = "EWD_HANGUP_WORKERS")]
    pub hangup_workers: bool,
}

impl DaemonConfig {
    /// Queue file path with `~` expanded
    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.config).into_owned())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_millis(self.read_timeout_ms),
        )
    }
}
