// order-relay/src/services/http_client.rs

//! The one seam through which the relay talks HTTP to the outside world.

use crate::errors::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
  pub url: String,
  pub body: Vec<u8>,
  /// Sent verbatim as the `Authorization` header when present.
  pub authorization: Option<String>,
}

impl OutboundRequest {
  pub fn new(url: impl Into<String>, body: Vec<u8>) -> Self {
    Self {
      url: url.into(),
      body,
      authorization: None,
    }
  }

  pub fn with_authorization(mut self, token: impl Into<String>) -> Self {
    self.authorization = Some(token.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
  pub status: u16,
  pub body: String,
}

impl OutboundReply {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// POSTs a JSON body. A reply with any status is `Ok`; only transport failures are errors.
#[async_trait]
pub trait OutboundHttp: Send + Sync {
  async fn post_json(&self, request: OutboundRequest) -> Result<OutboundReply>;
}

/// `reqwest`-backed client with a per-call timeout.
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
  client: reqwest::Client,
}

impl ReqwestHttp {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl OutboundHttp for ReqwestHttp {
  #[instrument(name = "http::post_json", skip(self, request), fields(url = %request.url, bytes = request.body.len()), err(Display))]
  async fn post_json(&self, request: OutboundRequest) -> Result<OutboundReply> {
    let mut builder = self
      .client
      .post(&request.url)
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(request.body);
    if let Some(token) = request.authorization {
      builder = builder.header(reqwest::header::AUTHORIZATION, token);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    debug!(status, "Outbound call answered.");
    Ok(OutboundReply { status, body })
  }
}
