//! Cart route handlers.
//!
//! Thin translation between HTTP forms and the cart workflow; all cart
//! decisions (corrupted-cart repair, session persistence) live in the
//! workflow itself.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::shopify::types::Cart;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub merchandise_id: String,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Response for a successful add.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub cart: Cart,
    /// Hint to the client to take the user to the cart view.
    pub navigate_to_cart: bool,
}

/// Display the current cart.
///
/// An unreadable cart renders as empty rather than failing the page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<Option<Cart>> {
    match state.cart().read_cart(&session).await {
        Ok(cart) => Json(cart),
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            Json(None)
        }
    }
}

/// Add an item to the cart, creating the cart if one doesn't exist.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<AddToCartResponse>> {
    let quantity = form.quantity.unwrap_or(1);

    let outcome = state
        .cart()
        .add_line(&session, &form.merchandise_id, quantity)
        .await?;

    Ok(Json(AddToCartResponse {
        cart: outcome.cart,
        navigate_to_cart: outcome.navigate_to_cart,
    }))
}

/// Update a cart line's quantity.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Json<Option<Cart>>> {
    let cart = state
        .cart()
        .update_line(&session, &form.line_id, form.quantity)
        .await?;

    Ok(Json(cart))
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Json<Option<Cart>>> {
    let cart = state.cart().remove_line(&session, &form.line_id).await?;
    Ok(Json(cart))
}

/// Redirect to Shopify's hosted checkout, or back to the cart when there is
/// nothing to check out.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let response = match state.cart().read_cart(&session).await? {
        Some(cart) => Redirect::to(&cart.checkout_url).into_response(),
        None => Redirect::to("/cart").into_response(),
    };
    Ok(response)
}
