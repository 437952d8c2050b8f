//! Rejected requests, misbehaving clients and shutdown leftovers

use std::time::Duration;

use ewd_core::domain::QueueConfig;
use ewd_integration_tests::{Daemon, Workspace};
use tokio::net::TcpStream;
use tokio_test::assert_ok;

const SETTLE: Duration = Duration::from_secs(10);

async fn start_build_queue(workspace: &Workspace) -> Daemon {
    let script = assert_ok!(workspace.worker_script("build.sh", Duration::from_millis(20)));
    assert_ok!(Daemon::start(vec![QueueConfig::new("build", 1, script.to_string_lossy())]).await)
}

#[tokio::test]
async fn test_bad_requests_are_dropped_and_daemon_keeps_serving() {
    let workspace = assert_ok!(Workspace::new());
    let daemon = start_build_queue(&workspace).await;

    assert_ok!(daemon.submit(b"nope job1\n").await);
    assert_ok!(daemon.submit(b"build\n").await);
    assert_ok!(daemon.submit(b" build job2\n").await);
    assert_ok!(daemon.submit(b"build job3").await);
    assert_ok!(daemon.submit(b"Build job4\n").await);
    assert_ok!(daemon.submit(b"build ok\n").await);

    assert!(workspace.wait_for_line("end ok", SETTLE).await);
    assert_eq!(workspace.log_lines(), vec!["start ok", "end ok"]);

    let _ = assert_ok!(daemon.stop().await);
}

#[tokio::test]
async fn test_oversized_request_is_rejected() {
    let workspace = assert_ok!(Workspace::new());
    let daemon = start_build_queue(&workspace).await;

    let mut big = b"build ".to_vec();
    big.extend(std::iter::repeat(b'x').take(2000));
    big.push(b'\n');
    // The daemon may close before reading everything; a reset is fine here
    let _ = daemon.submit(&big).await;

    let mut exact = b"build ".to_vec();
    exact.extend(std::iter::repeat(b'y').take(1024 - 7));
    exact.push(b'\n');
    assert_eq!(exact.len(), 1024);
    assert_ok!(daemon.submit(&exact).await);

    let last = format!("end {}", "y".repeat(1024 - 7));
    assert!(workspace.wait_for_line(&last, SETTLE).await);
    assert_eq!(workspace.log_lines().len(), 2);

    let _ = assert_ok!(daemon.stop().await);
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_read_timeout() {
    let workspace = assert_ok!(Workspace::new());
    let daemon = start_build_queue(&workspace).await;

    // Connected but never sends; held open for the whole test
    let _silent = assert_ok!(TcpStream::connect(daemon.addr()).await);
    assert_ok!(daemon.submit(b"build after\n").await);

    assert!(workspace.wait_for_line("end after", SETTLE).await);

    let _ = assert_ok!(daemon.stop().await);
}

#[tokio::test]
async fn test_spawn_failure_loses_only_that_job() {
    let workspace = assert_ok!(Workspace::new());
    let script = assert_ok!(workspace.worker_script("build.sh", Duration::from_millis(20)));
    let daemon = assert_ok!(
        Daemon::start(vec![
            QueueConfig::new("broken", 1, "/nonexistent/ewd-worker"),
            QueueConfig::new("build", 1, script.to_string_lossy()),
        ])
        .await
    );

    assert_ok!(daemon.submit(b"broken b1\n").await);
    assert_ok!(daemon.submit(b"build ok\n").await);

    assert!(workspace.wait_for_line("end ok", SETTLE).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (scheduler, retained) = assert_ok!(daemon.stop().await);

    // The failed job was discarded, so its queue was idle at shutdown
    assert!(retained.is_empty(), "retained: {:?}", retained);
    assert!(scheduler.registry().is_empty());
}

#[tokio::test]
async fn test_pending_jobs_keep_queue_at_shutdown() {
    let workspace = assert_ok!(Workspace::new());
    let script = assert_ok!(workspace.worker_script("parked.sh", Duration::from_millis(20)));
    let daemon = assert_ok!(
        Daemon::start(vec![
            QueueConfig::new("parked", 0, script.to_string_lossy()),
            QueueConfig::new("idle", 1, script.to_string_lossy()),
        ])
        .await
    );

    assert_ok!(daemon.submit(b"parked p1\n").await);
    assert_ok!(daemon.submit(b"parked p2\n").await);

    // A few ticks for both submissions to be filed
    tokio::time::sleep(Duration::from_millis(300)).await;

    let (scheduler, retained) = assert_ok!(daemon.stop().await);

    assert_eq!(retained.len(), 1);
    assert_eq!(retained[0].name, "parked");
    assert_eq!(retained[0].pending, 2);
    assert_eq!(retained[0].running, 0);
    assert!(scheduler.registry().lookup("idle").is_none());
    assert!(workspace.log_lines().is_empty());
}
