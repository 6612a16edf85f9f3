//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (marketing content + featured set)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (filter, sort, cursor paging)
//! GET  /products/featured      - Featured products
//! GET  /products/{handle}      - Product detail
//!
//! # Cart
//! GET  /cart                   - Current cart
//! POST /cart/add               - Add a line (creates the cart if needed)
//! POST /cart/update            - Update a line's quantity
//! POST /cart/remove            - Remove a line
//! GET  /checkout               - Redirect to Shopify checkout
//!
//! # Webhooks
//! POST /webhooks/shopify/products - Product change notification (HMAC signed)
//! ```

pub mod cart;
pub mod home;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/{handle}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/shopify/products", post(webhooks::products_changed))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // Webhook routes
        .nest("/webhooks", webhook_routes())
}
