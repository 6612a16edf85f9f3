//! Cart-id persistence in the caller's session.
//!
//! The session only ever holds the opaque Shopify cart id; everything else
//! about the cart lives upstream. The trait exists so the workflow can run
//! against an in-memory session in tests.

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

/// Session keys used by the storefront.
pub mod session_keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";
}

/// Failure reading or writing the session.
#[derive(Debug, Error)]
#[error("session error: {0}")]
pub struct SessionError(pub String);

impl From<tower_sessions::session::Error> for SessionError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self(err.to_string())
    }
}

/// Access to the cart id held by the current caller's session.
#[async_trait]
pub trait CartSession: Send + Sync {
    /// The stored cart id, if any.
    async fn cart_id(&self) -> Result<Option<String>, SessionError>;

    /// Persist `cart_id` for subsequent requests.
    async fn set_cart_id(&self, cart_id: &str) -> Result<(), SessionError>;

    /// Forget the stored cart id.
    async fn clear_cart_id(&self) -> Result<(), SessionError>;
}

#[async_trait]
impl CartSession for Session {
    async fn cart_id(&self) -> Result<Option<String>, SessionError> {
        Ok(self.get::<String>(session_keys::CART_ID).await?)
    }

    async fn set_cart_id(&self, cart_id: &str) -> Result<(), SessionError> {
        Ok(self.insert(session_keys::CART_ID, cart_id).await?)
    }

    async fn clear_cart_id(&self) -> Result<(), SessionError> {
        self.remove::<String>(session_keys::CART_ID).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory [`CartSession`] double.
    #[derive(Default)]
    pub(crate) struct MemorySession {
        cart_id: Mutex<Option<String>>,
    }

    impl MemorySession {
        pub(crate) fn with_cart_id(cart_id: &str) -> Self {
            Self {
                cart_id: Mutex::new(Some(cart_id.to_string())),
            }
        }

        pub(crate) fn stored(&self) -> Option<String> {
            self.cart_id.lock().expect("session lock").clone()
        }
    }

    #[async_trait]
    impl CartSession for MemorySession {
        async fn cart_id(&self) -> Result<Option<String>, SessionError> {
            Ok(self.stored())
        }

        async fn set_cart_id(&self, cart_id: &str) -> Result<(), SessionError> {
            *self.cart_id.lock().expect("session lock") = Some(cart_id.to_string());
            Ok(())
        }

        async fn clear_cart_id(&self) -> Result<(), SessionError> {
            *self.cart_id.lock().expect("session lock") = None;
            Ok(())
        }
    }
}
