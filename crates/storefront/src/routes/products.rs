//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::{PageSpec, ProductFilter, SortOrder};
use crate::error::{AppError, Result};
use crate::shopify::types::{Product, ProductPage};
use crate::state::AppState;

/// Default size of the featured set.
const DEFAULT_FEATURED_COUNT: i64 = 4;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    /// Free-text search.
    pub q: Option<String>,
    /// Exact product type.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    /// Only products available for sale.
    #[serde(default)]
    pub in_stock: bool,
    /// Sort order; unknown values sort as default.
    pub sort: Option<String>,
    /// Forward-paging cursor.
    pub after: Option<String>,
    /// Backward-paging cursor. Takes precedence over `after`.
    pub before: Option<String>,
}

/// Featured query parameters.
#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub count: Option<i64>,
}

/// Product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ProductPage>> {
    let filter = ProductFilter {
        text: query.q,
        product_type: query.product_type,
        in_stock: query.in_stock,
    };

    let page = if let Some(before) = query.before {
        PageSpec::Backward {
            last: crate::catalog::DEFAULT_PAGE_SIZE,
            before: Some(before),
        }
    } else {
        PageSpec::Forward {
            first: crate::catalog::DEFAULT_PAGE_SIZE,
            after: query.after,
        }
    };

    let sort = query
        .sort
        .as_deref()
        .map_or(SortOrder::Default, SortOrder::parse);

    let result = state.catalog().product_list(&filter, &page, sort).await?;
    Ok(Json(result))
}

/// Product detail by handle.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    let product = state
        .catalog()
        .product_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound(handle))?;

    Ok(Json(product))
}

/// Featured products.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<Product>>> {
    let count = query
        .count
        .filter(|&c| (1..=24).contains(&c))
        .unwrap_or(DEFAULT_FEATURED_COUNT);

    let products = state.catalog().featured(count).await?;
    Ok(Json(products))
}
