//! EWD Job-Dispatch Daemon - Main Entry Point

mod config;
mod logging;
mod queue_file;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use config::DaemonConfig;
use ewd_core::application::{shutdown_channel, Scheduler, ShutdownSender};
use ewd_core::port::time_provider::SystemTimeProvider;
use ewd_infra_system::{TcpRequestListener, TokioProcessLauncher};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SIGINT/SIGTERM only flip the shutdown token; the scheduler closes the socket itself
fn install_signal_handlers(shutdown: ShutdownSender) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        let mut interrupt = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = terminate.recv() => info!("SIGTERM received"),
                _ = interrupt.recv() => info!("SIGINT received"),
            }
            shutdown.shutdown();
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received");
                shutdown.shutdown();
            }
        });
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = DaemonConfig::parse();

    // 1. Initialize logging
    let _log_guard = logging::init(&config)?;
    info!("EWD v{} starting...", VERSION);

    // 2. Signal handling
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    install_signal_handlers(shutdown_tx)
        .map_err(|e| anyhow::anyhow!("Unable to set up signal handlers: {}", e))?;

    // 3. Load queues (zero queues is fatal)
    let config_path = config.config_path();
    info!(path = %config_path.display(), "Loading queues...");
    let registry = queue_file::load_registry(&config_path)?;

    // 4. Listen (setup failure is fatal)
    let listener = TcpRequestListener::bind(config.listen_addr()).await?;

    // 5. Run the scheduler loop
    let mut scheduler = Scheduler::new(
        registry,
        Arc::new(TokioProcessLauncher::new()),
        Arc::new(SystemTimeProvider),
        config.scheduler_config(),
    );

    info!("System ready. Waiting for jobs...");
    let retained = scheduler.run(listener, shutdown_rx).await;

    // 6. Leftover work (each retained queue was already reported by cleanup)
    if !retained.is_empty() {
        warn!(queues = retained.len(), "Exiting with outstanding work");
    }
    if config.hangup_workers {
        let signalled = scheduler.hangup_workers();
        info!(workers = signalled, "Sent SIGHUP to remaining workers");
    }

    info!("Exiting");
    Ok(())
}
