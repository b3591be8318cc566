// tests/queue_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use order_relay::errors::{AppError, Result};
use order_relay::queue::{InboundMessage, MessageHandler, OrderQueue, ReservationOutcome};
use order_relay::services::OrderReservationConsumer;
use order_relay::storage::MemoryBlobStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn spawn_consumer(h: Harness) -> (OrderQueue, Arc<RecordingHttp>) {
  let consumer = Arc::new(OrderReservationConsumer::new(h.state.clone()));
  tokio::spawn(h.worker.run(consumer));
  (h.state.queue.clone(), h.http)
}

#[tokio::test(start_paused = true)]
async fn test_injected_failure_is_delivered_three_times_then_escalated() {
  let store = Arc::new(MemoryBlobStore::new());
  let (queue, http) = spawn_consumer(harness(test_config(&[("TEST_FAILURE", "true")]), store.clone()));
  let started = Instant::now();

  queue.enqueue(order_body(&sample_order(1, 3))).unwrap();
  queue.wait_idle().await;

  let stats = queue.stats();
  assert_eq!(stats.received, 3);
  assert_eq!(stats.redelivered, 2);
  assert_eq!(stats.escalated, 1);
  assert_eq!(stats.stored, 0);
  assert_eq!(stats.acknowledged(), 1);
  assert_eq!(queue.outstanding(), 0);
  // 15s after the first failure, 30s after the second.
  assert!(started.elapsed() >= Duration::from_secs(45));

  let escalations = http.escalations();
  assert_eq!(escalations.len(), 1);
  assert!(escalations[0].message.contains("Id: 1"));
  assert_eq!(escalations[0].order.id, 1);
  assert_eq!(store.object_count("orders"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_healthy_order_is_acknowledged_on_first_delivery() {
  let store = Arc::new(MemoryBlobStore::new());
  let (queue, http) = spawn_consumer(harness(test_config(&[]), store.clone()));

  queue.enqueue(order_body(&sample_order(1, 3))).unwrap();
  queue.wait_idle().await;

  let stats = queue.stats();
  assert_eq!(stats.received, 1);
  assert_eq!(stats.stored, 1);
  assert_eq!(stats.redelivered, 0);
  assert_eq!(store.object_count("orders"), 1);
  assert!(http.escalations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_attempt_counts_are_isolated_between_concurrent_messages() {
  let store = Arc::new(MemoryBlobStore::new());
  let (queue, http) = spawn_consumer(harness(test_config(&[("TEST_FAILURE", "true")]), store.clone()));

  for id in 1..=3 {
    queue.enqueue(order_body(&sample_order(id, 3))).unwrap();
  }
  for id in 10..=12 {
    queue.enqueue(order_body(&sample_order(id, 1))).unwrap();
  }
  queue.wait_idle().await;

  let stats = queue.stats();
  // Every failing order gets its own three deliveries; healthy ones need only one.
  assert_eq!(stats.received, 3 * 3 + 3);
  assert_eq!(stats.escalated, 3);
  assert_eq!(stats.stored, 3);
  assert_eq!(store.object_count("orders"), 3);

  let mut escalated_ids: Vec<i32> = http.escalations().iter().map(|e| e.order.id).collect();
  escalated_ids.sort_unstable();
  assert_eq!(escalated_ids, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_lands_in_dead_letters() {
  let (queue, http) = spawn_consumer(harness(test_config(&[]), Arc::new(MemoryBlobStore::new())));

  let message_id = queue.enqueue("not json at all").unwrap();
  queue.wait_idle().await;

  let dead = queue.dead_letters();
  assert_eq!(dead.len(), 1);
  assert_eq!(dead[0].message.message_id, message_id);
  assert_eq!(dead[0].message.delivery_count, 1);
  assert!(dead[0].reason.contains("Malformed order payload"));
  assert_eq!(queue.stats().dead_lettered, 1);
  assert!(http.escalations().is_empty());
}

/// Always asks for a redelivery and remembers the delivery counts it saw.
#[derive(Default)]
struct AlwaysFailing {
  seen: Mutex<Vec<u32>>,
}

#[async_trait]
impl MessageHandler for AlwaysFailing {
  async fn handle(&self, message: &InboundMessage) -> Result<ReservationOutcome> {
    self.seen.lock().push(message.delivery_count);
    Err(AppError::TransientStorage("store offline".to_string()))
  }
}

#[tokio::test(start_paused = true)]
async fn test_delivery_limit_moves_message_to_dead_letters() {
  setup_tracing();
  let config = test_config(&[("QUEUE_MAX_DELIVERY_COUNT", "4")]);
  let (queue, worker) = OrderQueue::channel(config.queue.clone());
  let handler = Arc::new(AlwaysFailing::default());
  tokio::spawn(worker.run(handler.clone()));

  queue.enqueue("{}").unwrap();
  queue.wait_idle().await;

  assert_eq!(*handler.seen.lock(), vec![1, 2, 3, 4]);
  let stats = queue.stats();
  assert_eq!(stats.redelivered, 3);
  assert_eq!(stats.dead_lettered, 1);
  assert!(queue.dead_letters()[0].reason.contains("max delivery count"));
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_after_worker_is_gone_fails() {
  setup_tracing();
  let config = test_config(&[]);
  let (queue, worker) = OrderQueue::channel(config.queue.clone());
  drop(worker);

  assert!(matches!(queue.enqueue("{}"), Err(AppError::Internal(_))));
  assert_eq!(queue.outstanding(), 0);
}

/// Takes a while to store, then records that it finished.
#[derive(Default)]
struct SlowStore {
  finished: Mutex<bool>,
}

#[async_trait]
impl MessageHandler for SlowStore {
  async fn handle(&self, _message: &InboundMessage) -> Result<ReservationOutcome> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    *self.finished.lock() = true;
    Ok(ReservationOutcome::Stored {
      object_key: "slow".to_string(),
    })
  }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight_delivery() {
  setup_tracing();
  let config = test_config(&[]);
  let (queue, worker) = OrderQueue::channel(config.queue.clone());
  let handler = Arc::new(SlowStore::default());
  let running = tokio::spawn(worker.run(handler.clone()));

  queue.enqueue("{}").unwrap();
  tokio::time::sleep(Duration::from_millis(20)).await;
  queue.shutdown();
  running.await.unwrap();

  assert!(*handler.finished.lock());
  assert_eq!(queue.outstanding(), 0);
  assert_eq!(queue.stats().stored, 1);
}

#[tokio::test(start_paused = true)]
async fn test_dead_letter_list_keeps_only_the_newest_entries() {
  let config = test_config(&[("QUEUE_MAX_DEAD_LETTERS", "2"), ("QUEUE_MAX_CONCURRENT_CALLS", "1")]);
  let (queue, _http) = spawn_consumer(harness(config, Arc::new(MemoryBlobStore::new())));

  let ids: Vec<_> = (0..3).map(|i| queue.enqueue(format!("garbage {}", i)).unwrap()).collect();
  queue.wait_idle().await;

  let kept: Vec<_> = queue.dead_letters().iter().map(|d| d.message.message_id).collect();
  assert_eq!(kept, vec![ids[1], ids[2]]);
  assert_eq!(queue.stats().dead_lettered, 3);
}
