//! End-to-end dispatch over TCP with real worker processes

use std::time::Duration;

use ewd_core::domain::QueueConfig;
use ewd_integration_tests::{Daemon, Workspace};
use tokio_test::assert_ok;

const JOB_RUNTIME: Duration = Duration::from_millis(300);
const SETTLE: Duration = Duration::from_secs(10);

fn max_overlap(lines: &[String]) -> usize {
    let (mut running, mut peak) = (0usize, 0usize);
    for line in lines {
        if line.starts_with("start ") {
            running += 1;
            peak = peak.max(running);
        } else if line.starts_with("end ") {
            running = running.saturating_sub(1);
        }
    }
    peak
}

#[tokio::test]
async fn test_single_slot_queue_runs_jobs_in_order() {
    let workspace = assert_ok!(Workspace::new());
    let script = assert_ok!(workspace.worker_script("build.sh", JOB_RUNTIME));
    let daemon = assert_ok!(
        Daemon::start(vec![QueueConfig::new("build", 1, script.to_string_lossy())]).await
    );

    assert_ok!(daemon.submit(b"build job1\n").await);
    assert_ok!(daemon.submit(b"build job2\n").await);

    assert!(workspace.wait_for_line("end job2", SETTLE).await);
    assert_eq!(
        workspace.log_lines(),
        vec!["start job1", "end job1", "start job2", "end job2"]
    );

    // Let the last worker exit so shutdown finds nothing outstanding
    tokio::time::sleep(Duration::from_millis(300)).await;
    let (scheduler, retained) = assert_ok!(daemon.stop().await);

    assert!(retained.is_empty(), "retained: {:?}", retained);
    assert!(scheduler.registry().is_empty());
}

#[tokio::test]
async fn test_concurrency_never_exceeds_max_workers() {
    let workspace = assert_ok!(Workspace::new());
    let script = assert_ok!(workspace.worker_script("index.sh", JOB_RUNTIME));
    let daemon = assert_ok!(
        Daemon::start(vec![QueueConfig::new("index", 2, script.to_string_lossy())]).await
    );

    for n in 1..=5 {
        assert_ok!(daemon.submit(format!("index doc{}\n", n).as_bytes()).await);
    }

    for n in 1..=5 {
        assert!(
            workspace.wait_for_line(&format!("end doc{}", n), SETTLE).await,
            "doc{} never finished",
            n
        );
    }

    let lines = workspace.log_lines();
    assert_eq!(lines.len(), 10);
    assert!(max_overlap(&lines) <= 2, "log: {:?}", lines);

    // Admission is FIFO
    let starts: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.strip_prefix("start "))
        .collect();
    assert_eq!(starts, vec!["doc1", "doc2", "doc3", "doc4", "doc5"]);

    let _ = assert_ok!(daemon.stop().await);
}

#[tokio::test]
async fn test_queues_progress_independently() {
    let workspace = assert_ok!(Workspace::new());
    let slow = assert_ok!(workspace.worker_script("slow.sh", Duration::from_secs(2)));
    let fast = assert_ok!(workspace.worker_script("fast.sh", Duration::from_millis(50)));
    let daemon = assert_ok!(
        Daemon::start(vec![
            QueueConfig::new("slow", 1, slow.to_string_lossy()),
            QueueConfig::new("fast", 1, fast.to_string_lossy()),
        ])
        .await
    );

    assert_ok!(daemon.submit(b"slow s1\n").await);
    assert_ok!(daemon.submit(b"fast f1\n").await);

    // fast finishes while slow still holds its only slot
    assert!(workspace.wait_for_line("end f1", SETTLE).await);
    assert!(!workspace.log_lines().contains(&"end s1".to_string()));

    let (scheduler, retained) = assert_ok!(daemon.stop().await);

    // slow is still running at shutdown, so it stays registered
    assert_eq!(retained.len(), 1);
    assert_eq!(retained[0].name, "slow");
    assert_eq!(retained[0].running, 1);
    assert!(scheduler.registry().lookup("fast").is_none());
}

#[tokio::test]
async fn test_arguments_are_passed_as_one_argument() {
    let workspace = assert_ok!(Workspace::new());
    let script = assert_ok!(workspace.worker_script("echo.sh", Duration::from_millis(10)));
    let daemon = assert_ok!(
        Daemon::start(vec![QueueConfig::new("echo", 1, script.to_string_lossy())]).await
    );

    assert_ok!(daemon.submit(b"echo  hello   big world\r\n").await);

    assert!(workspace.wait_for_line("end hello   big world", SETTLE).await);
    assert_eq!(workspace.log_lines()[0], "start hello   big world");

    let _ = assert_ok!(daemon.stop().await);
}
