// order-relay/src/queue/runtime.rs

use crate::config::QueueSettings;
use crate::errors::{AppError, Result};
use crate::queue::message::{InboundMessage, MessageHandler, ReservationOutcome};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
  pub message: InboundMessage,
  pub reason: String,
  pub dead_lettered_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct QueueStats {
  received: AtomicU64,
  stored: AtomicU64,
  escalated: AtomicU64,
  redelivered: AtomicU64,
  dead_lettered: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatsSnapshot {
  /// Deliveries handed to the handler, redeliveries included.
  pub received: u64,
  pub stored: u64,
  pub escalated: u64,
  pub redelivered: u64,
  pub dead_lettered: u64,
}

impl QueueStatsSnapshot {
  /// Messages taken off the queue for good.
  pub fn acknowledged(&self) -> u64 {
    self.stored + self.escalated + self.dead_lettered
  }
}

struct QueueShared {
  stats: QueueStats,
  dead_letters: RwLock<VecDeque<DeadLetter>>,
  max_dead_letters: usize,
  /// Messages enqueued but not yet settled, pending redeliveries included.
  outstanding: AtomicUsize,
  /// Failed deliveries sleeping out their backoff.
  awaiting_redelivery: AtomicUsize,
  idle: Notify,
  shutdown: watch::Sender<bool>,
}

impl QueueShared {
  fn settle(&self) {
    if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
      self.idle.notify_waiters();
    }
  }
}

/// Producer side of the order queue. Cheap to clone.
#[derive(Clone)]
pub struct OrderQueue {
  tx: mpsc::UnboundedSender<InboundMessage>,
  shared: Arc<QueueShared>,
}

impl OrderQueue {
  /// Creates the queue and the worker that drains it. The worker does nothing until
  /// [`QueueWorker::run`] is awaited or spawned.
  pub fn channel(settings: QueueSettings) -> (OrderQueue, QueueWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let queue = OrderQueue {
      tx,
      shared: Arc::new(QueueShared {
        stats: QueueStats::default(),
        dead_letters: RwLock::new(VecDeque::new()),
        max_dead_letters: settings.max_dead_letters,
        outstanding: AtomicUsize::new(0),
        awaiting_redelivery: AtomicUsize::new(0),
        idle: Notify::new(),
        shutdown,
      }),
    };
    let worker = QueueWorker {
      rx,
      queue: queue.clone(),
      settings,
      shutdown_rx,
    };
    (queue, worker)
  }

  pub fn enqueue(&self, body: impl Into<String>) -> Result<Uuid> {
    self.enqueue_message(InboundMessage::new(body))
  }

  pub fn enqueue_message(&self, message: InboundMessage) -> Result<Uuid> {
    let message_id = message.message_id;
    self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
    if self.tx.send(message).is_err() {
      self.shared.settle();
      return Err(AppError::Internal("order queue is closed".to_string()));
    }
    Ok(message_id)
  }

  pub fn stats(&self) -> QueueStatsSnapshot {
    let s = &self.shared.stats;
    QueueStatsSnapshot {
      received: s.received.load(Ordering::SeqCst),
      stored: s.stored.load(Ordering::SeqCst),
      escalated: s.escalated.load(Ordering::SeqCst),
      redelivered: s.redelivered.load(Ordering::SeqCst),
      dead_lettered: s.dead_lettered.load(Ordering::SeqCst),
    }
  }

  /// Most recent dead letters, oldest first.
  pub fn dead_letters(&self) -> Vec<DeadLetter> {
    self.shared.dead_letters.read().iter().cloned().collect()
  }

  pub fn outstanding(&self) -> usize {
    self.shared.outstanding.load(Ordering::SeqCst)
  }

  /// Resolves once every enqueued message has been settled.
  pub async fn wait_idle(&self) {
    loop {
      let notified = self.shared.idle.notified();
      if self.outstanding() == 0 {
        return;
      }
      notified.await;
    }
  }

  /// Stops taking new deliveries. [`QueueWorker::run`] returns once the deliveries
  /// already handed to the handler have finished.
  pub fn shutdown(&self) {
    self.shared.shutdown.send_replace(true);
  }

  fn dead_letter(&self, message: InboundMessage, reason: String) {
    error!(message_id = %message.message_id, delivery_count = message.delivery_count, %reason, "Message dead-lettered.");
    self.shared.stats.dead_lettered.fetch_add(1, Ordering::SeqCst);
    let mut dead_letters = self.shared.dead_letters.write();
    dead_letters.push_back(DeadLetter {
      message,
      reason,
      dead_lettered_at: Utc::now(),
    });
    while dead_letters.len() > self.shared.max_dead_letters {
      dead_letters.pop_front();
    }
  }
}

/// Consumer side: pulls deliveries and runs the handler on them, up to
/// `max_concurrent_calls` at a time.
pub struct QueueWorker {
  rx: mpsc::UnboundedReceiver<InboundMessage>,
  queue: OrderQueue,
  settings: QueueSettings,
  shutdown_rx: watch::Receiver<bool>,
}

enum WorkerEvent {
  Delivery(InboundMessage),
  Reaped,
  ShutdownChanged,
  Stop,
}

impl QueueWorker {
  pub async fn run(mut self, handler: Arc<dyn MessageHandler>) {
    let permits = Arc::new(Semaphore::new(self.settings.max_concurrent_calls));
    let mut deliveries = JoinSet::new();
    info!(max_concurrent_calls = self.settings.max_concurrent_calls, "Order queue worker started.");

    loop {
      let event = tokio::select! {
        changed = self.shutdown_rx.changed() => match changed {
          Ok(()) => WorkerEvent::ShutdownChanged,
          Err(_) => WorkerEvent::Stop,
        },
        received = self.rx.recv() => match received {
          Some(message) => WorkerEvent::Delivery(message),
          None => WorkerEvent::Stop,
        },
        Some(joined) = deliveries.join_next(), if !deliveries.is_empty() => {
          log_join_failure(joined);
          WorkerEvent::Reaped
        }
      };
      let message = match event {
        WorkerEvent::Delivery(message) => message,
        WorkerEvent::Reaped => continue,
        WorkerEvent::ShutdownChanged if *self.shutdown_rx.borrow() => break,
        WorkerEvent::ShutdownChanged => continue,
        WorkerEvent::Stop => break,
      };

      let Ok(permit) = permits.clone().acquire_owned().await else {
        break;
      };
      let queue = self.queue.clone();
      let settings = self.settings.clone();
      let handler = handler.clone();
      let span = tracing::info_span!(
        "queue_delivery",
        message_id = %message.message_id,
        delivery_count = message.delivery_count
      );
      deliveries.spawn(
        async move {
          let _permit = permit;
          deliver(&queue, &settings, handler.as_ref(), message).await;
        }
        .instrument(span),
      );
    }

    if !deliveries.is_empty() {
      info!(in_flight = deliveries.len(), "Waiting for in-flight deliveries before stopping.");
    }
    while let Some(joined) = deliveries.join_next().await {
      log_join_failure(joined);
    }

    let shared = &self.queue.shared;
    let awaiting_redelivery = shared.awaiting_redelivery.load(Ordering::SeqCst);
    let outstanding = shared.outstanding.load(Ordering::SeqCst);
    if outstanding > 0 {
      warn!(
        queued = outstanding.saturating_sub(awaiting_redelivery),
        awaiting_redelivery,
        "Order queue worker stopped with undelivered messages."
      );
    }
    info!("Order queue worker stopped.");
  }
}

fn log_join_failure(joined: std::result::Result<(), tokio::task::JoinError>) {
  if let Err(e) = joined {
    error!(error = %e, "Delivery task ended abnormally.");
  }
}

async fn deliver(queue: &OrderQueue, settings: &QueueSettings, handler: &dyn MessageHandler, message: InboundMessage) {
  let stats = &queue.shared.stats;
  stats.received.fetch_add(1, Ordering::SeqCst);

  match handler.handle(&message).await {
    Ok(ReservationOutcome::Stored { object_key }) => {
      info!(%object_key, "Delivery completed; message acknowledged.");
      stats.stored.fetch_add(1, Ordering::SeqCst);
      queue.shared.settle();
    }
    Ok(ReservationOutcome::Escalated) => {
      warn!("Delivery escalated; message acknowledged.");
      stats.escalated.fetch_add(1, Ordering::SeqCst);
      queue.shared.settle();
    }
    Ok(ReservationOutcome::DeadLettered { reason }) => {
      queue.dead_letter(message, reason);
      queue.shared.settle();
    }
    Err(err) if message.delivery_count >= settings.max_delivery_count => {
      queue.dead_letter(message, format!("max delivery count reached: {}", err));
      queue.shared.settle();
    }
    Err(err) => {
      let delay = settings.retry.backoff_for(message.delivery_count);
      warn!(error = %err, delay_secs = delay.as_secs(), "Delivery failed; scheduling redelivery.");
      stats.redelivered.fetch_add(1, Ordering::SeqCst);
      queue.shared.awaiting_redelivery.fetch_add(1, Ordering::SeqCst);
      let queue = queue.clone();
      let next = message.redelivered();
      tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        queue.shared.awaiting_redelivery.fetch_sub(1, Ordering::SeqCst);
        if queue.tx.send(next).is_err() {
          warn!("Order queue closed before redelivery; message dropped.");
          queue.shared.settle();
        }
      });
    }
  }
}
