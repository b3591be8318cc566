// order-relay/src/services/sas_signer.rs

//! Builds shared access signature tokens for the order bus.

use crate::errors::{AppError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, instrument};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of the token attached to every bus publish.
pub const PUBLISH_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Signs `resource_uri` with the current wall-clock time.
///
/// # Arguments
/// * `resource_uri`: The bus resource the token grants access to.
/// * `key_name`: Name of the shared access policy.
/// * `key`: The policy's secret key, used as raw UTF-8 bytes for the HMAC.
/// * `ttl`: How long the token stays valid.
///
/// # Returns
/// The full `Authorization` header value, or `AppError::Signing` when the key cannot
/// seed the MAC.
pub fn sign(resource_uri: &str, key_name: &str, key: &str, ttl: Duration) -> Result<String> {
  sign_at(resource_uri, key_name, key, ttl, Utc::now())
}

/// Deterministic form of [`sign`]: same inputs and same `now` give the same token.
#[instrument(name = "sas_signer::sign_at", skip_all, fields(%resource_uri, %key_name, ttl_secs = ttl.as_secs()))]
pub fn sign_at(resource_uri: &str, key_name: &str, key: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
  let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| AppError::Signing(format!("ttl {:?} is out of range", ttl)))?;
  let expiry = now.timestamp() + ttl_secs;
  let encoded_uri = urlencoding::encode(resource_uri);
  let string_to_sign = format!("{}\n{}", encoded_uri, expiry);

  let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| AppError::Signing(format!("invalid signing key: {}", e)))?;
  mac.update(string_to_sign.as_bytes());
  let signature = BASE64.encode(mac.finalize().into_bytes());

  debug!(expiry, "Shared access signature created.");
  Ok(format!(
    "SharedAccessSignature sr={}&sig={}&se={}&skn={}",
    encoded_uri,
    urlencoding::encode(&signature),
    expiry,
    key_name
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  const URI: &str = "https://orders-bus.servicebus.windows.net/orders";
  const KEY_NAME: &str = "RootManageSharedAccessKey";
  const KEY: &str = "c2VjcmV0LWtleQ==";

  fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
  }

  #[test]
  fn test_known_token() {
    let token = sign_at(URI, KEY_NAME, KEY, PUBLISH_TOKEN_TTL, fixed_now()).unwrap();
    assert_eq!(
      token,
      "SharedAccessSignature sr=https%3A%2F%2Forders-bus.servicebus.windows.net%2Forders\
       &sig=UNz3yF1TF9FHAijJLWQJQrRwTueRrKxBOT6QSIs2gg8%3D&se=1700086400&skn=RootManageSharedAccessKey"
    );
  }

  #[test]
  fn test_same_inputs_same_token() {
    let a = sign_at(URI, KEY_NAME, KEY, PUBLISH_TOKEN_TTL, fixed_now()).unwrap();
    let b = sign_at(URI, KEY_NAME, KEY, PUBLISH_TOKEN_TTL, fixed_now()).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn test_every_input_changes_the_token() {
    let base = sign_at(URI, KEY_NAME, KEY, PUBLISH_TOKEN_TTL, fixed_now()).unwrap();
    let later = fixed_now() + chrono::Duration::seconds(1);
    let variants = [
      sign_at("https://orders-bus.servicebus.windows.net/other", KEY_NAME, KEY, PUBLISH_TOKEN_TTL, fixed_now()),
      sign_at(URI, "SendOnly", KEY, PUBLISH_TOKEN_TTL, fixed_now()),
      sign_at(URI, KEY_NAME, "another-key", PUBLISH_TOKEN_TTL, fixed_now()),
      sign_at(URI, KEY_NAME, KEY, Duration::from_secs(60), fixed_now()),
      sign_at(URI, KEY_NAME, KEY, PUBLISH_TOKEN_TTL, later),
    ];
    for variant in variants {
      assert_ne!(variant.unwrap(), base);
    }
  }

  #[test]
  fn test_expiry_is_now_plus_ttl() {
    let token = sign_at(URI, KEY_NAME, KEY, Duration::from_secs(90), fixed_now()).unwrap();
    assert!(token.contains("&se=1700000090&"));
  }
}
