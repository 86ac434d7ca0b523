use crate::{PoolConfig, ShutdownOutcome, WorkerId, WorkerPool};
use core::time::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{Instant, sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn config(initial_workers: usize, queue_capacity: usize, delay_ms: u64) -> PoolConfig {
    PoolConfig {
        initial_workers,
        queue_capacity,
        process_delay: Duration::from_millis(delay_ms),
    }
}

fn ids(raw: &[u64]) -> Vec<WorkerId> {
    raw.iter().copied().map(WorkerId::new).collect()
}

async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn ids_start_at_zero_and_increase() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    assert_eq!(pool.add_workers(3), ids(&[0, 1, 2]));
    assert_eq!(pool.worker_ids(), ids(&[0, 1, 2]));
    pool.stop_all();
}

#[tokio::test]
async fn remove_evicts_most_recent_first() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    pool.add_workers(3);

    assert_eq!(pool.remove_worker(), Some(WorkerId::new(2)));
    assert_eq!(pool.remove_worker(), Some(WorkerId::new(1)));
    assert_eq!(pool.remove_worker(), Some(WorkerId::new(0)));
    assert_eq!(pool.remove_worker(), None);

    timeout(WAIT, pool.wait()).await.expect("workers did not exit");
}

#[tokio::test]
async fn remove_on_empty_leaves_state_unchanged() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    let before = pool.stats();

    assert_eq!(pool.remove_worker(), None);
    assert_eq!(pool.remove_workers(3), 0);
    assert_eq!(pool.stats(), before);
}

#[tokio::test]
async fn ids_are_never_reused_after_removal() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    let mut seen = HashSet::new();

    for round in 0..5 {
        for id in pool.add_workers(round + 1) {
            assert!(seen.insert(id), "worker id {id} handed out twice");
        }
        pool.remove_workers(round);
    }

    let live = pool.worker_ids();
    assert_eq!(live.len(), live.iter().collect::<HashSet<_>>().len());
    assert_eq!(pool.stats().workers_created, seen.len() as u64);

    pool.stop_all();
    timeout(WAIT, pool.wait()).await.expect("workers did not exit");
}

#[tokio::test]
async fn remove_workers_stops_early_when_empty() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    pool.add_workers(2);

    assert_eq!(pool.remove_workers(5), 2);
    assert_eq!(pool.active_workers(), 0);
}

#[tokio::test]
async fn add_after_remove_continues_the_sequence() {
    let pool = WorkerPool::new(&config(0, 8, 0));
    pool.add_workers(3);
    pool.remove_worker();

    assert_eq!(pool.add_worker(), Some(WorkerId::new(3)));
    assert_eq!(pool.worker_ids(), ids(&[0, 1, 3]));
    pool.stop_all();
}

#[tokio::test]
async fn stop_all_then_wait_drains_to_zero() {
    let pool = WorkerPool::start(&config(4, 8, 0));
    assert_eq!(pool.active_workers(), 4);

    assert_eq!(pool.stop_all(), 4);
    timeout(WAIT, pool.wait()).await.expect("workers did not exit");

    let stats = pool.stats();
    assert_eq!(stats.active_workers, 0);
    assert_eq!(stats.running_tasks, 0);
    assert_eq!(stats.workers_created, 4);
}

#[tokio::test]
async fn stop_all_leaves_the_pool_usable() {
    let pool = WorkerPool::start(&config(2, 8, 0));
    assert_eq!(pool.stop_all(), 2);

    assert_eq!(pool.add_worker(), Some(WorkerId::new(2)));
    assert!(!pool.is_shut_down());
    pool.shutdown(WAIT).await;
}

#[tokio::test]
async fn workers_cannot_be_added_after_shutdown() {
    let pool = WorkerPool::start(&config(1, 8, 0));
    assert_eq!(pool.shutdown(WAIT).await, ShutdownOutcome::Graceful);
    assert!(pool.is_shut_down());

    assert_eq!(pool.add_worker(), None);
    assert!(pool.add_workers(3).is_empty());
    assert!(pool.send("after-shutdown"));
    sleep(Duration::from_millis(50)).await;

    let stats = pool.stats();
    assert_eq!(stats.workers_created, 1);
    assert_eq!(stats.active_workers, 0);
    assert_eq!(stats.running_tasks, 0);
    assert_eq!(stats.messages_processed, 0);
    assert_eq!(stats.queue_length, 1);
}

#[tokio::test]
async fn send_respects_capacity_without_consumers() {
    let pool = WorkerPool::new(&config(0, 5, 0));

    let sent = (0..5).filter(|i| pool.send(format!("m{i}"))).count();
    assert_eq!(sent, 5);
    assert!(!pool.send("overflow"));

    let stats = pool.stats();
    assert_eq!(stats.queue_length, 5);
    assert_eq!(stats.messages_total, 5);
    assert_eq!(stats.messages_rejected, 1);
    assert_eq!(stats.active_workers, 0);
}

#[tokio::test]
async fn workers_drain_the_queue_and_count_processed() {
    let pool = WorkerPool::start(&config(3, 32, 0));
    for i in 0..20 {
        assert!(pool.send(format!("job-{i}")));
    }

    eventually("queue to drain", || pool.stats().messages_processed == 20).await;
    assert_eq!(pool.stats().queue_length, 0);

    pool.shutdown(WAIT).await;
}

#[tokio::test]
async fn processing_does_not_touch_the_id_counter() {
    let pool = WorkerPool::start(&config(1, 8, 0));
    for i in 0..5 {
        pool.send(format!("m{i}"));
    }
    eventually("messages to be processed", || {
        pool.stats().messages_processed == 5
    })
    .await;

    assert_eq!(pool.stats().workers_created, 1);
    assert_eq!(pool.add_worker(), Some(WorkerId::new(1)));
    pool.shutdown(WAIT).await;
}

#[tokio::test]
async fn cancellation_waits_for_in_flight_message() {
    let pool = WorkerPool::start(&config(1, 4, 300));
    pool.send("slow");

    eventually("worker to pick up the message", || {
        pool.stats().messages_processed == 1
    })
    .await;

    assert_eq!(pool.remove_worker(), Some(WorkerId::new(0)));
    // Still sleeping through the simulated work.
    assert_eq!(pool.running_tasks(), 1);

    timeout(WAIT, pool.wait()).await.expect("worker did not exit");
    assert_eq!(pool.running_tasks(), 0);
}

#[tokio::test]
async fn close_input_lets_idle_workers_exit() {
    let pool = WorkerPool::start(&config(2, 4, 0));
    pool.close_input();
    pool.close_input();

    timeout(WAIT, pool.wait()).await.expect("workers did not drain");
    assert!(!pool.send("late"));
    assert_eq!(pool.stats().messages_rejected, 1);
}

#[tokio::test]
async fn shutdown_is_graceful_when_workers_are_idle() {
    let pool = WorkerPool::start(&config(3, 4, 0));
    assert_eq!(pool.shutdown(WAIT).await, ShutdownOutcome::Graceful);
    assert_eq!(pool.running_tasks(), 0);
    assert_eq!(pool.active_workers(), 0);
    assert!(!pool.queue().is_closed());
}

#[tokio::test]
async fn shutdown_escalates_past_the_deadline() {
    let pool = WorkerPool::start(&config(1, 4, 200));
    pool.send("slow");
    eventually("worker to pick up the message", || {
        pool.stats().messages_processed == 1
    })
    .await;

    let outcome = pool.shutdown(Duration::from_millis(10)).await;

    assert_eq!(outcome, ShutdownOutcome::Forced);
    assert!(pool.queue().is_closed());
    assert_eq!(pool.running_tasks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_scaling_keeps_registry_consistent() {
    let pool = Arc::new(WorkerPool::new(&config(0, 64, 0)));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                for _ in 0..25 {
                    pool.add_worker();
                    if i % 2 == 0 {
                        pool.remove_worker();
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.workers_created, 200);
    assert_eq!(stats.active_workers, 100);
    assert_eq!(pool.worker_ids().len(), 100);

    assert_eq!(pool.shutdown(WAIT).await, ShutdownOutcome::Graceful);
    assert_eq!(pool.stats().active_workers, 0);
}

#[tokio::test]
async fn end_to_end_scale_send_and_stop() {
    let pool = WorkerPool::start(&config(2, 5, 10));

    for msg in ["a", "b", "c"] {
        assert!(pool.send(msg));
    }
    assert!(pool.stats().queue_length <= 5);

    eventually("queue to drain", || pool.stats().queue_length == 0).await;

    assert_eq!(pool.remove_worker(), Some(WorkerId::new(1)));
    assert_eq!(pool.active_workers(), 1);

    assert_eq!(pool.stop_all(), 1);
    assert_eq!(pool.active_workers(), 0);

    timeout(WAIT, pool.wait()).await.expect("workers did not exit");

    let stats = pool.stats();
    assert_eq!(stats.queue_length, 0);
    assert_eq!(stats.messages_total, 3);
    assert_eq!(stats.messages_processed, 3);
    assert_eq!(stats.workers_created, 2);
    assert_eq!(stats.running_tasks, 0);
}
