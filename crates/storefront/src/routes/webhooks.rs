//! Shopify webhook handlers.
//!
//! Shopify signs each delivery with base64(HMAC-SHA256(raw body)) in the
//! `X-Shopify-Hmac-Sha256` header. Verification runs over the raw body bytes
//! before any parsing; a payload that fails verification is never looked at.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::instrument;

use crate::cache::versions::CacheFamily;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Signature header set by Shopify on webhook deliveries.
const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying a webhook delivery.
#[derive(Debug, PartialEq, Eq)]
enum WebhookAuth {
    /// No webhook secret is configured; the endpoint cannot verify anything.
    Unconfigured,
    /// Signature missing, undecodable, or wrong.
    Invalid,
    Verified,
}

/// Verify a delivery's signature against the raw body.
///
/// Uses `Mac::verify_slice` for a constant-time comparison of the decoded
/// signature.
fn verify_signature(
    secret: Option<&SecretString>,
    signature_header: Option<&str>,
    body: &[u8],
) -> WebhookAuth {
    let Some(secret) = secret else {
        return WebhookAuth::Unconfigured;
    };

    let Some(signature) = signature_header else {
        return WebhookAuth::Invalid;
    };
    let Ok(signature) = BASE64.decode(signature) else {
        return WebhookAuth::Invalid;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return WebhookAuth::Invalid;
    };
    mac.update(body);

    if mac.verify_slice(&signature).is_ok() {
        WebhookAuth::Verified
    } else {
        WebhookAuth::Invalid
    }
}

/// The slice of a product webhook payload we act on.
#[derive(Debug, Deserialize)]
struct ProductPayload {
    #[serde(default)]
    handle: Option<String>,
}

/// Handle a product change notification.
///
/// Bumps the listing and featured generations, and directly deletes the
/// changed product's point-lookup entry when the payload names a handle.
/// Invalidation failures surface as errors so Shopify retries the delivery.
#[instrument(skip(state, headers, body))]
pub async fn products_changed(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let signature = headers.get(HMAC_HEADER).and_then(|v| v.to_str().ok());

    match verify_signature(
        state.config().shopify.webhook_secret.as_ref(),
        signature,
        &body,
    ) {
        WebhookAuth::Unconfigured => {
            // A missing secret is our misconfiguration, not the caller's.
            return Err(AppError::Internal(
                "webhook secret not configured".to_string(),
            ));
        }
        WebhookAuth::Invalid => {
            tracing::warn!("Rejected webhook with invalid signature");
            return Err(AppError::Unauthorized("invalid signature".to_string()));
        }
        WebhookAuth::Verified => {}
    }

    state.catalog().invalidate(CacheFamily::Products).await?;
    state.catalog().invalidate(CacheFamily::Featured).await?;

    // The payload shape varies per topic; only the handle matters here.
    if let Ok(payload) = serde_json::from_slice::<ProductPayload>(&body)
        && let Some(handle) = payload.handle
    {
        state.catalog().invalidate_handle(&handle).await?;
        tracing::info!(handle = %handle, "Invalidated product entry from webhook");
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}
