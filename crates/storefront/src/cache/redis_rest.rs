//! Cache store backed by an Upstash-style Redis REST endpoint.
//!
//! Single-command REST protocol: `GET {base}/get/{key}`,
//! `POST {base}/set/{key}?EX={secs}` with the value as the request body, and
//! `POST {base}/del/{key}`, all authenticated with a bearer token. Responses
//! carry a `{"result": ...}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::RedisRestConfig;

use super::{CacheError, CacheStore, prefixed};

/// [`CacheStore`] over the Redis REST protocol.
pub struct RedisRestStore {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

#[derive(Deserialize)]
struct RestResult<T> {
    result: T,
}

impl RedisRestStore {
    /// Create a store for the configured REST endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &RedisRestConfig) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: config.rest_url.trim_end_matches('/').to_string(),
            token: config.rest_token.clone(),
        })
    }

    async fn command<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CacheError> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CacheError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let envelope: RestResult<T> = serde_json::from_str(&body)?;
        Ok(envelope.result)
    }

    fn key_url(&self, command: &str, key: &str) -> String {
        format!(
            "{}/{command}/{}",
            self.base_url,
            urlencoding::encode(&prefixed(key))
        )
    }
}

#[async_trait]
impl CacheStore for RedisRestStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let raw: Option<String> = self
            .command(self.client.get(self.key_url("get", key)))
            .await?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut url = self.key_url("set", key);
        if let Some(ttl) = ttl {
            url.push_str(&format!("?EX={}", ttl.as_secs().max(1)));
        }

        let body = serde_json::to_string(&value)?;
        let _: serde_json::Value = self.command(self.client.post(url).body(body)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _: serde_json::Value = self
            .command(self.client.post(self.key_url("del", key)))
            .await?;
        Ok(())
    }
}
