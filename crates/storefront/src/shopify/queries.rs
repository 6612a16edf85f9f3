//! GraphQL documents and response envelopes for the Storefront API.
//!
//! Documents are plain strings; the cart documents share a fragment and are
//! assembled once into `LazyLock<String>` statics. Response envelopes are
//! serde-typed and unwrap into the domain types in [`super::types`].

use std::sync::LazyLock;

use serde::Deserialize;

use super::types::{Cart, Product, ProductPage, UserError};

pub const PRODUCTS_QUERY: &str = r"
query Products(
  $first: Int
  $after: String
  $last: Int
  $before: String
  $query: String
  $sortKey: ProductSortKeys
  $reverse: Boolean
) {
  products(
    first: $first
    after: $after
    last: $last
    before: $before
    query: $query
    sortKey: $sortKey
    reverse: $reverse
  ) {
    pageInfo {
      hasNextPage
      endCursor
      hasPreviousPage
      startCursor
    }
    nodes {
      id
      handle
      title
      productType
      tags
      featuredImage {
        url
        altText
        width
        height
      }
      priceRange {
        minVariantPrice {
          amount
          currencyCode
        }
      }
      variants(first: 1) {
        nodes {
          id
        }
      }
    }
  }
}
";

pub const PRODUCT_BY_HANDLE_QUERY: &str = r"
query ProductByHandle($handle: String!) {
  productByHandle(handle: $handle) {
    id
    handle
    title
    description
    featuredImage {
      url
      altText
      width
      height
    }
    images(first: 10) {
      nodes {
        url
        altText
        width
        height
      }
    }
    options {
      id
      name
      values
    }
    variants(first: 50) {
      nodes {
        id
        title
        availableForSale
        selectedOptions {
          name
          value
        }
        price {
          amount
          currencyCode
        }
      }
    }
  }
}
";

const CART_FRAGMENT: &str = r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount {
      amount
      currencyCode
    }
    totalAmount {
      amount
      currencyCode
    }
  }
  lines(first: 50) {
    nodes {
      id
      quantity
      merchandise {
        ... on ProductVariant {
          id
          title
          product {
            handle
            title
            featuredImage {
              url
              altText
            }
          }
          price {
            amount
            currencyCode
          }
        }
      }
    }
  }
}
";

pub static CART_QUERY: LazyLock<String> = LazyLock::new(|| {
    format!(
        r"query Cart($id: ID!) {{
  cart(id: $id) {{
    ...CartFields
  }}
}}
{CART_FRAGMENT}"
    )
});

pub static CART_CREATE_MUTATION: LazyLock<String> = LazyLock::new(|| {
    format!(
        r"mutation CartCreate($input: CartInput) {{
  cartCreate(input: $input) {{
    cart {{
      ...CartFields
    }}
    userErrors {{
      field
      message
    }}
  }}
}}
{CART_FRAGMENT}"
    )
});

pub static CART_LINES_ADD_MUTATION: LazyLock<String> = LazyLock::new(|| {
    format!(
        r"mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {{
  cartLinesAdd(cartId: $cartId, lines: $lines) {{
    cart {{
      ...CartFields
    }}
    userErrors {{
      field
      message
    }}
  }}
}}
{CART_FRAGMENT}"
    )
});

pub static CART_LINES_UPDATE_MUTATION: LazyLock<String> = LazyLock::new(|| {
    format!(
        r"mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {{
  cartLinesUpdate(cartId: $cartId, lines: $lines) {{
    cart {{
      ...CartFields
    }}
    userErrors {{
      field
      message
    }}
  }}
}}
{CART_FRAGMENT}"
    )
});

pub static CART_LINES_REMOVE_MUTATION: LazyLock<String> = LazyLock::new(|| {
    format!(
        r"mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {{
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {{
    cart {{
      ...CartFields
    }}
    userErrors {{
      field
      message
    }}
  }}
}}
{CART_FRAGMENT}"
    )
});

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: ProductPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductByHandleData {
    pub product_by_handle: Option<Product>,
}

#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Option<Cart>,
}

/// Shared payload shape of all cart mutations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<Cart>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddData {
    pub cart_lines_add: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateData {
    pub cart_lines_update: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesRemoveData {
    pub cart_lines_remove: Option<CartMutationPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_query_includes_fragment_once() {
        let doc = &*CART_QUERY;
        assert!(doc.contains("query Cart($id: ID!)"));
        assert_eq!(doc.matches("fragment CartFields on Cart").count(), 1);
    }

    #[test]
    fn test_mutation_payload_deserializes_user_errors() {
        let raw = serde_json::json!({
            "cartLinesAdd": {
                "cart": null,
                "userErrors": [
                    { "field": ["lines", "0", "merchandiseId"], "message": "Invalid id" }
                ]
            }
        });
        let data: CartLinesAddData = serde_json::from_value(raw).expect("deserialize");
        let payload = data.cart_lines_add.expect("payload");
        assert!(payload.cart.is_none());
        assert_eq!(payload.user_errors.len(), 1);
    }
}
