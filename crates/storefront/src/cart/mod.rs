//! Cart mutation workflow over the session-held cart id.
//!
//! The session token must either reference a usable cart or be treated as
//! absent. Reads never mutate the session; mutation paths clear a stale id
//! and recreate the cart upstream as needed. `add_line` additionally repairs
//! carts carrying zero-quantity lines before adding, because Shopify may merge
//! a new add into a stale zero-quantity line and produce an inconsistent
//! total.
//!
//! None of these operations are idempotent: each `add_line` call adds
//! `quantity` more units, and concurrent mutations resolve by upstream merge
//! semantics (no compare-and-swap here).

mod session;

pub use session::{CartSession, SessionError, session_keys};

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};
use crate::shopify::{ShopifyError, StorefrontApi};

/// Valid quantity range for a cart line at this boundary. Shopify itself may
/// transiently hold zero-quantity lines; those are repaired, never created.
const QUANTITY_RANGE: std::ops::RangeInclusive<i64> = 1..=99;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Caller-supplied parameter failed a precondition. No upstream call was
    /// made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream call failed (transport, GraphQL, or user error).
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// Session could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result of a successful `add_line`.
#[derive(Debug)]
pub struct AddToCartOutcome {
    /// The cart after the add.
    pub cart: Cart,
    /// The workflow signals that the caller should take the client to the
    /// cart view; whether to actually navigate is the caller's decision.
    pub navigate_to_cart: bool,
}

/// Orchestrates cart mutations against the Storefront API.
pub struct CartWorkflow {
    api: Arc<dyn StorefrontApi>,
}

impl CartWorkflow {
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    /// Read the current cart, or `None` when the session has no usable cart.
    ///
    /// "No usable cart" covers a missing session id, an id Shopify no longer
    /// knows, and the corrupted state where every line has quantity zero and
    /// the total is zero. The session itself is never mutated here; clearing
    /// a stale id is reserved for mutation paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the session or the upstream fetch fails.
    #[instrument(skip(self, session))]
    pub async fn read_cart(&self, session: &dyn CartSession) -> Result<Option<Cart>, CartError> {
        let Some(cart_id) = session.cart_id().await? else {
            return Ok(None);
        };

        let Some(cart) = self.api.get_cart(&cart_id).await? else {
            return Ok(None);
        };

        if is_corrupted(&cart) {
            tracing::warn!(cart_id = %cart.id, "Treating corrupted cart as absent");
            return Ok(None);
        }

        Ok(Some(cart))
    }

    /// Add a single line to the caller's cart, creating the cart if needed.
    ///
    /// Steps: validate input, obtain a usable cart (clearing a stale session
    /// id first), remove any zero-quantity lines, add the line, persist the
    /// (possibly new) cart id. A user error at any step aborts the operation;
    /// partial progress from the zero-line repair is left in place since the
    /// repair is itself a consistency fix.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidInput`] before any upstream call when the
    /// input fails validation, otherwise propagates session and upstream
    /// failures.
    #[instrument(skip(self, session), fields(merchandise_id = %merchandise_id))]
    pub async fn add_line(
        &self,
        session: &dyn CartSession,
        merchandise_id: &str,
        quantity: i64,
    ) -> Result<AddToCartOutcome, CartError> {
        if merchandise_id.is_empty() {
            return Err(CartError::InvalidInput("missing merchandise id".to_string()));
        }
        validate_quantity(quantity)?;

        let mut cart = self.ensure_cart(session).await?;

        let zero_line_ids: Vec<String> = cart
            .lines
            .nodes
            .iter()
            .filter(|line| line.quantity == 0)
            .map(|line| line.id.clone())
            .collect();
        if !zero_line_ids.is_empty() {
            tracing::warn!(
                cart_id = %cart.id,
                count = zero_line_ids.len(),
                "Removing zero-quantity lines before add"
            );
            if let Some(cleaned) = self.api.remove_lines(&cart.id, zero_line_ids).await? {
                cart = cleaned;
            }
        }

        let cart = self
            .api
            .add_lines(
                &cart.id,
                vec![CartLineInput {
                    merchandise_id: merchandise_id.to_string(),
                    quantity,
                }],
            )
            .await?;

        session.set_cart_id(&cart.id).await?;

        Ok(AddToCartOutcome {
            cart,
            navigate_to_cart: true,
        })
    }

    /// Update one line's quantity. A missing session is a no-op, not an
    /// error: there is nothing to update.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidInput`] on bad input, otherwise propagates
    /// session and upstream failures.
    #[instrument(skip(self, session), fields(line_id = %line_id))]
    pub async fn update_line(
        &self,
        session: &dyn CartSession,
        line_id: &str,
        quantity: i64,
    ) -> Result<Option<Cart>, CartError> {
        if line_id.is_empty() {
            return Err(CartError::InvalidInput("missing line id".to_string()));
        }
        validate_quantity(quantity)?;

        let Some(cart_id) = session.cart_id().await? else {
            return Ok(None);
        };

        let cart = self
            .api
            .update_lines(
                &cart_id,
                vec![CartLineUpdateInput {
                    id: line_id.to_string(),
                    quantity,
                }],
            )
            .await?;

        Ok(Some(cart))
    }

    /// Remove one line. A missing session is a no-op. When Shopify reports
    /// the cart as gone afterwards (removing the last line may delete the
    /// cart), the session id is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidInput`] on bad input, otherwise propagates
    /// session and upstream failures.
    #[instrument(skip(self, session), fields(line_id = %line_id))]
    pub async fn remove_line(
        &self,
        session: &dyn CartSession,
        line_id: &str,
    ) -> Result<Option<Cart>, CartError> {
        if line_id.is_empty() {
            return Err(CartError::InvalidInput("missing line id".to_string()));
        }

        let Some(cart_id) = session.cart_id().await? else {
            return Ok(None);
        };

        match self
            .api
            .remove_lines(&cart_id, vec![line_id.to_string()])
            .await?
        {
            Some(cart) => Ok(Some(cart)),
            None => {
                session.clear_cart_id().await?;
                Ok(None)
            }
        }
    }

    /// Obtain a usable cart, creating one upstream when the session has none
    /// or references an invalid one. A stale session id is cleared before the
    /// create so the token never points at an unusable cart.
    async fn ensure_cart(&self, session: &dyn CartSession) -> Result<Cart, CartError> {
        if let Some(cart) = self.read_cart(session).await? {
            return Ok(cart);
        }

        if session.cart_id().await?.is_some() {
            session.clear_cart_id().await?;
        }

        Ok(self.api.create_cart().await?)
    }
}

/// Corrupted-cart detection: at least one line, every line quantity zero,
/// total quantity zero.
fn is_corrupted(cart: &Cart) -> bool {
    !cart.lines.nodes.is_empty()
        && cart.lines.nodes.iter().all(|line| line.quantity == 0)
        && cart.total_quantity == 0
}

fn validate_quantity(quantity: i64) -> Result<(), CartError> {
    if QUANTITY_RANGE.contains(&quantity) {
        Ok(())
    } else {
        Err(CartError::InvalidInput(format!(
            "quantity must be between {} and {}, got {quantity}",
            QUANTITY_RANGE.start(),
            QUANTITY_RANGE.end(),
        )))
    }
}
