//! Domain types for the Shopify Storefront API.
//!
//! These mirror the fields selected by the GraphQL documents in
//! [`super::queries`], so they double as wire types (camelCase via serde).
//! Fields that only appear in one of the product selections are defaulted.

use serde::{Deserialize, Serialize};

/// A monetary amount with its currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

/// A product or variant image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
}

/// Generic GraphQL connection holding only its nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
}

/// Cursor pagination metadata for a product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Price range of a product (minimum variant price only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: Money,
}

/// A selectable product option (e.g. "Size").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    pub values: Vec<String>,
}

/// A chosen option on a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// A purchasable product variant.
///
/// The list query selects only `id`; the detail query selects the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub available_for_sale: bool,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[serde(default)]
    pub price: Option<Money>,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: Option<Image>,
    #[serde(default)]
    pub images: Option<Connection<Image>>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub variants: Option<Connection<ProductVariant>>,
}

/// One page of a paginated product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub page_info: PageInfo,
    pub nodes: Vec<Product>,
}

/// The product a cart line's merchandise belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProduct {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub featured_image: Option<Image>,
}

/// The variant referenced by a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    pub id: String,
    pub title: String,
    pub product: MerchandiseProduct,
    pub price: Money,
}

/// A line item in a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    pub merchandise: Merchandise,
}

/// Cost breakdown of a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    pub subtotal_amount: Money,
    pub total_amount: Money,
}

/// A server-side Shopify cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCost,
    pub lines: Connection<CartLine>,
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

/// Input for updating an existing cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

/// A field-scoped user error returned by a cart mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Join a mutation's user errors into one human-readable message.
///
/// Each error renders as `field.path: message`; errors without a field path
/// render as the bare message.
#[must_use]
pub fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sort keys accepted by the products query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSortKey {
    Title,
    Price,
    CreatedAt,
}

/// Variables for the paginated products query.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsVariables {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub last: Option<i64>,
    pub before: Option<String>,
    pub query: Option<String>,
    pub sort_key: Option<ProductSortKey>,
    pub reverse: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_user_errors_with_fields() {
        let errors = vec![
            UserError {
                field: Some(vec!["lines".into(), "0".into(), "quantity".into()]),
                message: "Quantity must be positive".into(),
            },
            UserError {
                field: None,
                message: "Cart is locked".into(),
            },
        ];
        assert_eq!(
            join_user_errors(&errors),
            "lines.0.quantity: Quantity must be positive; Cart is locked"
        );
    }

    #[test]
    fn test_join_user_errors_empty_field_path() {
        let errors = vec![UserError {
            field: Some(vec![]),
            message: "broken".into(),
        }];
        assert_eq!(join_user_errors(&errors), "broken");
    }

    #[test]
    fn test_sort_key_serializes_screaming_snake() {
        let vars = ProductsVariables {
            sort_key: Some(ProductSortKey::CreatedAt),
            ..Default::default()
        };
        let json = serde_json::to_value(&vars).expect("serialize");
        assert_eq!(json["sortKey"], "CREATED_AT");
    }

    #[test]
    fn test_cart_deserializes_from_wire_shape() {
        let raw = serde_json::json!({
            "id": "gid://shopify/Cart/abc",
            "checkoutUrl": "https://shop.example/checkout",
            "totalQuantity": 2,
            "cost": {
                "subtotalAmount": { "amount": "19.98", "currencyCode": "USD" },
                "totalAmount": { "amount": "19.98", "currencyCode": "USD" }
            },
            "lines": {
                "nodes": [{
                    "id": "gid://shopify/CartLine/1",
                    "quantity": 2,
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/42",
                        "title": "Default Title",
                        "product": {
                            "handle": "balloon-whisk",
                            "title": "Balloon Whisk",
                            "featuredImage": null
                        },
                        "price": { "amount": "9.99", "currencyCode": "USD" }
                    }
                }]
            }
        });
        let cart: Cart = serde_json::from_value(raw).expect("deserialize cart");
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.lines.nodes.len(), 1);
        assert_eq!(cart.lines.nodes[0].merchandise.product.handle, "balloon-whisk");
    }

    #[test]
    fn test_product_list_shape_defaults_detail_fields() {
        let raw = serde_json::json!({
            "id": "gid://shopify/Product/1",
            "handle": "pastry-brush",
            "title": "Pastry Brush",
            "productType": "Tools",
            "tags": ["featured"],
            "featuredImage": null,
            "priceRange": { "minVariantPrice": { "amount": "4.50", "currencyCode": "USD" } },
            "variants": { "nodes": [{ "id": "gid://shopify/ProductVariant/7" }] }
        });
        let product: Product = serde_json::from_value(raw).expect("deserialize product");
        assert!(product.description.is_none());
        assert!(product.options.is_empty());
        assert_eq!(
            product.variants.as_ref().map(|v| v.nodes.len()),
            Some(1)
        );
    }
}
