//! EWD Submit - fire-and-forget client for the EWD job-dispatch daemon
//!
//! Writes a single `<queue> <args>\n` line and closes the connection. The
//! daemon never answers, so success only means the request was delivered.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const DEFAULT_ADDR: &str = "127.0.0.1:8277";
const MAX_REQUEST_BYTES: usize = 1024;

#[derive(Parser)]
#[command(name = "ewd-submit")]
#[command(about = "Submit a job to an EWD daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon address
    #[arg(long, env = "EWD_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Target queue name
    queue: String,

    /// Job arguments, joined with single spaces into one argument string
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Build the wire request for one job
fn format_request(queue: &str, args: &[String]) -> Result<String> {
    if queue.is_empty() || queue.contains([' ', '\t', '\n']) {
        anyhow::bail!("Invalid queue name {:?}: must be non-empty without whitespace", queue);
    }

    let args = args.join(" ");
    if args.contains('\n') {
        anyhow::bail!("Job arguments must not contain a newline");
    }

    let request = format!("{} {}\n", queue, args);
    if request.len() > MAX_REQUEST_BYTES {
        anyhow::bail!(
            "Request is {} bytes, the daemon accepts at most {}",
            request.len(),
            MAX_REQUEST_BYTES
        );
    }
    Ok(request)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let request = format_request(&cli.queue, &cli.args)?;

    let mut stream = TcpStream::connect(&cli.addr)
        .await
        .with_context(|| format!("Failed to connect to daemon at {}", cli.addr))?;
    stream
        .write_all(request.as_bytes())
        .await
        .context("Failed to send request")?;
    stream.shutdown().await.context("Failed to close connection")?;

    println!(
        "{}",
        format!("✓ Submitted to queue {}", cli.queue).green().bold()
    );
    Ok(())
}
