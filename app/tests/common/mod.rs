// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use order_relay::config::AppConfig;
use order_relay::errors::{AppError, Result};
use order_relay::models::{CatalogItemOrdered, EscalationMessage, Order, OrderItem};
use order_relay::queue::{InboundMessage, QueueWorker};
use order_relay::services::{OutboundHttp, OutboundReply, OutboundRequest};
use order_relay::state::AppState;
use order_relay::storage::{BlobProperties, BlobStore, MemoryBlobStore};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::Level;

pub const BUS_ENDPOINT: &str = "https://orders-bus.servicebus.windows.net/orders/messages";
pub const DELIVERY_ENDPOINT: &str = "https://delivery-processor.example.net/api/orders";
pub const WEBHOOK_URI: &str = "https://workflow.example.net/hooks/order-failed";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// One line: two units at 9.99 of `catalog_item_id`, total 19.98.
pub fn sample_order(id: i32, catalog_item_id: i32) -> Order {
  Order {
    id,
    order_items: vec![OrderItem {
      id: 1,
      item_ordered: CatalogItemOrdered {
        catalog_item_id,
        product_name: ".NET Bot Black Sweatshirt".to_string(),
        picture_uri: "http://catalogbaseurltobereplaced/images/products/1.png".to_string(),
      },
      unit_price: Decimal::new(999, 2),
      units: 2,
    }],
    total_cost: Decimal::new(1998, 2),
  }
}

pub fn order_body(order: &Order) -> String {
  serde_json::to_string(order).unwrap()
}

/// The message as seen on its `delivery_count`th delivery.
pub fn delivery(body: &str, delivery_count: u32) -> InboundMessage {
  let mut message = InboundMessage::new(body);
  for _ in 1..delivery_count {
    message = message.redelivered();
  }
  message
}

pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = [
    ("SERVICE_BUS_ENDPOINT", BUS_ENDPOINT),
    ("SERVICE_BUS_KEY_NAME", "RootManageSharedAccessKey"),
    ("SERVICE_BUS_KEY", "c2VjcmV0LWtleQ=="),
    ("DELIVERY_ORDER_PROCESSOR_ENDPOINT", DELIVERY_ENDPOINT),
    ("LOGIC_APP_URI", WEBHOOK_URI),
  ]
  .iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect();
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_lookup(move |name| vars.get(name).cloned()).unwrap()
}

/// Outbound HTTP double: records every request and answers 200 unless told otherwise.
#[derive(Default)]
pub struct RecordingHttp {
  requests: Mutex<Vec<OutboundRequest>>,
  statuses: Mutex<HashMap<String, u16>>,
  unreachable: Mutex<HashSet<String>>,
}

impl RecordingHttp {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond_with(&self, url: &str, status: u16) {
    self.statuses.lock().insert(url.to_string(), status);
  }

  pub fn refuse_connections(&self, url: &str) {
    self.unreachable.lock().insert(url.to_string());
  }

  pub fn requests_to(&self, url: &str) -> Vec<OutboundRequest> {
    self.requests.lock().iter().filter(|r| r.url == url).cloned().collect()
  }

  pub fn escalations(&self) -> Vec<EscalationMessage> {
    self
      .requests_to(WEBHOOK_URI)
      .iter()
      .map(|r| serde_json::from_slice(&r.body).unwrap())
      .collect()
  }
}

#[async_trait]
impl OutboundHttp for RecordingHttp {
  async fn post_json(&self, request: OutboundRequest) -> Result<OutboundReply> {
    let url = request.url.clone();
    self.requests.lock().push(request);
    if self.unreachable.lock().contains(&url) {
      return Err(AppError::Internal(format!("connection refused: {}", url)));
    }
    let status = self.statuses.lock().get(&url).copied().unwrap_or(200);
    Ok(OutboundReply {
      status,
      body: format!("status {}", status),
    })
  }
}

/// Memory store whose first `failures` uploads are rejected.
pub struct FlakyStore {
  pub inner: MemoryBlobStore,
  failures_left: AtomicU32,
  put_attempts: AtomicU32,
}

impl FlakyStore {
  pub fn failing(failures: u32) -> Arc<Self> {
    Arc::new(Self {
      inner: MemoryBlobStore::new(),
      failures_left: AtomicU32::new(failures),
      put_attempts: AtomicU32::new(0),
    })
  }

  pub fn put_attempts(&self) -> u32 {
    self.put_attempts.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl BlobStore for FlakyStore {
  async fn ensure_container(&self, container: &str) -> Result<bool> {
    self.inner.ensure_container(container).await
  }

  async fn exists(&self, container: &str) -> Result<bool> {
    self.inner.exists(container).await
  }

  async fn put(&self, container: &str, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
    self.put_attempts.fetch_add(1, Ordering::SeqCst);
    let remaining = self.failures_left.load(Ordering::SeqCst);
    if remaining > 0 {
      self.failures_left.store(remaining - 1, Ordering::SeqCst);
      return Err(AppError::TransientStorage("simulated storage outage".to_string()));
    }
    self.inner.put(container, key, bytes, content_type).await
  }

  async fn properties(&self, container: &str, key: &str) -> Result<Option<BlobProperties>> {
    self.inner.properties(container, key).await
  }
}

pub struct Harness {
  pub state: AppState,
  pub worker: QueueWorker,
  pub http: Arc<RecordingHttp>,
}

pub fn harness(config: AppConfig, store: Arc<dyn BlobStore>) -> Harness {
  setup_tracing();
  let http = RecordingHttp::new();
  let (state, worker) = AppState::build(Arc::new(config), store, http.clone());
  Harness { state, worker, http }
}
