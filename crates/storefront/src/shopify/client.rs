//! Storefront API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;

use super::queries::{
    CART_CREATE_MUTATION, CART_LINES_ADD_MUTATION, CART_LINES_REMOVE_MUTATION,
    CART_LINES_UPDATE_MUTATION, CART_QUERY, CartCreateData, CartData, CartLinesAddData,
    CartLinesRemoveData, CartLinesUpdateData, CartMutationPayload, PRODUCT_BY_HANDLE_QUERY,
    PRODUCTS_QUERY, ProductByHandleData, ProductsData,
};
use super::types::{
    Cart, CartLineInput, CartLineUpdateInput, Product, ProductPage, ProductsVariables,
    join_user_errors,
};
use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};

/// Operations the storefront exposes against the commerce API.
///
/// The catalog cache and cart workflow depend on this trait rather than the
/// concrete HTTP client so their behavior can be verified against recording
/// doubles.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Fetch one page of the product listing.
    async fn get_products(&self, vars: ProductsVariables) -> Result<ProductPage, ShopifyError>;

    /// Fetch a single product by handle; `None` when the handle is unknown.
    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError>;

    /// Fetch a cart by id; `None` when Shopify no longer knows the id.
    async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError>;

    /// Create a new, empty cart.
    async fn create_cart(&self) -> Result<Cart, ShopifyError>;

    /// Add lines to an existing cart.
    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError>;

    /// Update existing cart lines.
    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError>;

    /// Remove lines from a cart. Shopify may delete the cart entirely when its
    /// last line is removed, so the resulting cart is optional.
    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Option<Cart>, ShopifyError>;
}

/// HTTP client for the Shopify Storefront API.
pub struct StorefrontGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl StorefrontGateway {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Ok(Self {
            client,
            endpoint,
            access_token: config.storefront_private_token.expose_secret().to_string(),
        })
    }

    /// Execute a GraphQL document against the Storefront API.
    async fn execute<V, D>(&self, query: &str, variables: V) -> Result<D, ShopifyError>
    where
        V: Serialize + Send,
        D: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.endpoint)
            // Private access tokens use a different header than public tokens
            .header("Shopify-Storefront-Private-Token", &self.access_token)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            ))]));
        }

        let envelope: GraphQLResponse<D> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(WireGraphQLError::into_error).collect(),
            ));
        }

        envelope.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }
}

#[async_trait]
impl StorefrontApi for StorefrontGateway {
    #[instrument(skip(self))]
    async fn get_products(&self, vars: ProductsVariables) -> Result<ProductPage, ShopifyError> {
        let data: ProductsData = self.execute(PRODUCTS_QUERY, vars).await?;
        Ok(data.products)
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        let data: ProductByHandleData = self
            .execute(PRODUCT_BY_HANDLE_QUERY, json!({ "handle": handle }))
            .await?;
        Ok(data.product_by_handle)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError> {
        let data: CartData = self
            .execute(CART_QUERY.as_str(), json!({ "id": cart_id }))
            .await?;
        Ok(data.cart)
    }

    #[instrument(skip(self))]
    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let data: CartCreateData = self
            .execute(CART_CREATE_MUTATION.as_str(), json!({ "input": {} }))
            .await?;
        unwrap_mutation(data.cart_create, "cartCreate")?
            .ok_or_else(|| missing_cart("cartCreate"))
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesAddData = self
            .execute(
                CART_LINES_ADD_MUTATION.as_str(),
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;
        unwrap_mutation(data.cart_lines_add, "cartLinesAdd")?
            .ok_or_else(|| missing_cart("cartLinesAdd"))
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesUpdateData = self
            .execute(
                CART_LINES_UPDATE_MUTATION.as_str(),
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;
        unwrap_mutation(data.cart_lines_update, "cartLinesUpdate")?
            .ok_or_else(|| missing_cart("cartLinesUpdate"))
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Option<Cart>, ShopifyError> {
        let data: CartLinesRemoveData = self
            .execute(
                CART_LINES_REMOVE_MUTATION.as_str(),
                json!({ "cartId": cart_id, "lineIds": line_ids }),
            )
            .await?;
        // A missing cart after removal is legitimate (last line removed).
        unwrap_mutation(data.cart_lines_remove, "cartLinesRemove")
    }
}

/// Check a mutation payload for user errors before handing back its cart.
///
/// A non-empty `userErrors` list fails the whole operation even when a cart
/// object was returned alongside it.
fn unwrap_mutation(
    payload: Option<CartMutationPayload>,
    op: &'static str,
) -> Result<Option<Cart>, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "{op} returned no payload"
        ))]));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(join_user_errors(
            &payload.user_errors,
        )));
    }

    Ok(payload.cart)
}

fn missing_cart(op: &'static str) -> ShopifyError {
    ShopifyError::GraphQL(vec![GraphQLError::message(format!(
        "{op} returned no cart"
    ))])
}

#[derive(Debug, serde::Deserialize)]
struct GraphQLResponse<D> {
    data: Option<D>,
    errors: Option<Vec<WireGraphQLError>>,
}

#[derive(Debug, serde::Deserialize)]
struct WireGraphQLError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    locations: Option<Vec<WireErrorLocation>>,
    #[serde(default)]
    path: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, serde::Deserialize)]
struct WireErrorLocation {
    line: i64,
    column: i64,
}

impl WireGraphQLError {
    fn into_error(self) -> GraphQLError {
        GraphQLError {
            message: self.message,
            locations: self.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: l.line,
                        column: l.column,
                    })
                    .collect()
            }),
            path: self.path.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::UserError;

    fn payload(cart: Option<Cart>, errors: Vec<UserError>) -> CartMutationPayload {
        CartMutationPayload {
            cart,
            user_errors: errors,
        }
    }

    #[test]
    fn test_unwrap_mutation_no_payload() {
        let result = unwrap_mutation(None, "cartCreate");
        assert!(matches!(result, Err(ShopifyError::GraphQL(_))));
    }

    #[test]
    fn test_unwrap_mutation_user_errors_win_over_cart() {
        let cart = crate::shopify::testing::cart("gid://shopify/Cart/1", vec![]);
        let result = unwrap_mutation(
            Some(payload(
                Some(cart),
                vec![UserError {
                    field: Some(vec!["lines".into(), "0".into()]),
                    message: "Not enough stock".into(),
                }],
            )),
            "cartLinesAdd",
        );
        match result {
            Err(ShopifyError::UserError(msg)) => {
                assert_eq!(msg, "lines.0: Not enough stock");
            }
            other => panic!("expected user error, got {other:?}"),
        }
    }

    #[test]
    fn test_unwrap_mutation_passes_cart_through() {
        let cart = crate::shopify::testing::cart("gid://shopify/Cart/1", vec![]);
        let result = unwrap_mutation(Some(payload(Some(cart), vec![])), "cartLinesAdd");
        assert!(matches!(result, Ok(Some(_))));
    }
}
