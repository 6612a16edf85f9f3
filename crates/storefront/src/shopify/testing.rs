//! Test doubles and fixtures for the Storefront API.
//!
//! `RecordingApi` logs every upstream call in order so workflow tests can
//! assert sequencing (e.g. zero-line removal before an add).

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::ShopifyError;
use super::client::StorefrontApi;
use super::types::{
    Cart, CartCost, CartLine, CartLineInput, CartLineUpdateInput, Connection, Merchandise,
    MerchandiseProduct, Money, PageInfo, Product, ProductPage, ProductsVariables,
};

pub(crate) fn money(amount: &str) -> Money {
    Money {
        amount: amount.to_string(),
        currency_code: "USD".to_string(),
    }
}

pub(crate) fn line(id: &str, quantity: i64) -> CartLine {
    CartLine {
        id: id.to_string(),
        quantity,
        merchandise: Merchandise {
            id: format!("gid://shopify/ProductVariant/{id}"),
            title: "Default Title".to_string(),
            product: MerchandiseProduct {
                handle: "balloon-whisk".to_string(),
                title: "Balloon Whisk".to_string(),
                featured_image: None,
            },
            price: money("9.99"),
        },
    }
}

pub(crate) fn cart(id: &str, lines: Vec<CartLine>) -> Cart {
    let total_quantity = lines.iter().map(|l| l.quantity).sum();
    Cart {
        id: id.to_string(),
        checkout_url: "https://shop.example/checkout".to_string(),
        total_quantity,
        cost: CartCost {
            subtotal_amount: money("0.00"),
            total_amount: money("0.00"),
        },
        lines: Connection { nodes: lines },
    }
}

pub(crate) fn product(handle: &str) -> Product {
    Product {
        id: format!("gid://shopify/Product/{handle}"),
        handle: handle.to_string(),
        title: handle.to_string(),
        product_type: None,
        description: None,
        tags: vec![],
        featured_image: None,
        images: None,
        options: vec![],
        price_range: None,
        variants: None,
    }
}

pub(crate) fn page(nodes: Vec<Product>) -> ProductPage {
    ProductPage {
        page_info: PageInfo {
            has_next_page: false,
            has_previous_page: false,
            start_cursor: None,
            end_cursor: None,
        },
        nodes,
    }
}

/// Scripted [`StorefrontApi`] double that records every call in order.
pub(crate) struct RecordingApi {
    /// Ordered log of upstream calls, one entry per round-trip.
    pub calls: Mutex<Vec<String>>,
    /// Cart returned by `get_cart` and mutated by cart operations.
    pub cart: Mutex<Option<Cart>>,
    /// Page returned by `get_products`.
    pub products: Mutex<ProductPage>,
    /// Product returned by `get_product_by_handle`.
    pub product: Mutex<Option<Product>>,
    /// When set, `remove_lines` reports the cart as gone.
    pub remove_returns_none: AtomicBool,
    /// When set, `add_lines` fails with this user-error message.
    pub add_error: Mutex<Option<String>>,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            cart: Mutex::new(None),
            products: Mutex::new(page(vec![])),
            product: Mutex::new(None),
            remove_returns_none: AtomicBool::new(false),
            add_error: Mutex::new(None),
        }
    }
}

impl RecordingApi {
    pub(crate) fn with_cart(cart: Cart) -> Self {
        let api = Self::default();
        *api.cart.lock().unwrap() = Some(cart);
        api
    }

    pub(crate) fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl StorefrontApi for RecordingApi {
    async fn get_products(&self, _vars: ProductsVariables) -> Result<ProductPage, ShopifyError> {
        self.record("get_products");
        Ok(self.products.lock().unwrap().clone())
    }

    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        self.record(format!("get_product:{handle}"));
        Ok(self.product.lock().unwrap().clone())
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError> {
        self.record(format!("get_cart:{cart_id}"));
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        self.record("create_cart");
        let created = cart("gid://shopify/Cart/new", vec![]);
        *self.cart.lock().unwrap() = Some(created.clone());
        Ok(created)
    }

    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let first = lines.first().expect("add_lines called with no lines");
        self.record(format!(
            "add_lines:{cart_id}:{}:{}",
            first.merchandise_id, first.quantity
        ));

        if let Some(message) = self.add_error.lock().unwrap().clone() {
            return Err(ShopifyError::UserError(message));
        }

        let mut guard = self.cart.lock().unwrap();
        let mut current = guard.clone().unwrap_or_else(|| cart(cart_id, vec![]));
        for input in &lines {
            current
                .lines
                .nodes
                .push(line(&format!("L-{}", input.merchandise_id), input.quantity));
        }
        current.total_quantity = current.lines.nodes.iter().map(|l| l.quantity).sum();
        *guard = Some(current.clone());
        Ok(current)
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let first = lines.first().expect("update_lines called with no lines");
        self.record(format!("update_lines:{cart_id}:{}:{}", first.id, first.quantity));

        let mut guard = self.cart.lock().unwrap();
        let mut current = guard.clone().unwrap_or_else(|| cart(cart_id, vec![]));
        for input in &lines {
            if let Some(node) = current.lines.nodes.iter_mut().find(|l| l.id == input.id) {
                node.quantity = input.quantity;
            }
        }
        current.total_quantity = current.lines.nodes.iter().map(|l| l.quantity).sum();
        *guard = Some(current.clone());
        Ok(current)
    }

    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Option<Cart>, ShopifyError> {
        self.record(format!("remove_lines:{cart_id}:{}", line_ids.join(",")));

        if self.remove_returns_none.load(Ordering::SeqCst) {
            *self.cart.lock().unwrap() = None;
            return Ok(None);
        }

        let mut guard = self.cart.lock().unwrap();
        let mut current = guard.clone().unwrap_or_else(|| cart(cart_id, vec![]));
        current.lines.nodes.retain(|l| !line_ids.contains(&l.id));
        current.total_quantity = current.lines.nodes.iter().map(|l| l.quantity).sum();
        *guard = Some(current.clone());
        Ok(Some(current))
    }
}
