// order-relay/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use relay_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Signing Error: {0}")]
  Signing(String),

  #[error("HTTP transport error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Serialization Error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The bus rejected the order event or could not be reached.
  #[error("Publish failed: {0}")]
  Publish(String),

  #[error("Delivery processor trigger failed: {0}")]
  DownstreamTrigger(String),

  /// Store unreachable or the write was rejected.
  #[error("Transient storage error: {0}")]
  TransientStorage(String),

  #[error("Malformed order payload: {0}")]
  MalformedPayload(String),

  #[error("Injected test failure: {0}")]
  InjectedTestFailure(String),

  #[error("Escalation notification failed: {0}")]
  EscalationNotify(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Whether a failed delivery should go back to the queue for another attempt.
  pub fn is_retryable(&self) -> bool {
    matches!(self, AppError::TransientStorage(_) | AppError::InjectedTestFailure(_))
  }

  pub fn is_malformed_payload(&self) -> bool {
    matches!(self, AppError::MalformedPayload(_))
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::MalformedPayload(m) => HttpResponse::BadRequest().json(json!({"error": "Malformed order", "detail": m})),
      AppError::Publish(m) => HttpResponse::BadGateway().json(json!({"error": "Order event could not be published", "detail": m})),
      AppError::Http(e) => HttpResponse::BadGateway().json(json!({"error": "Upstream call failed", "detail": e.to_string()})),
      AppError::Config(m) | AppError::Signing(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        HttpResponse::InternalServerError().json(json!({"error": "Workflow processing error", "detail": source.to_string()}))
      }
      other => HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": other.to_string()})),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
