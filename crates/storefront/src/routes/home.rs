//! Home page handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::content::MarketingPage;
use crate::shopify::types::Product;
use crate::state::AppState;

const HOME_SLUG: &str = "home";
const HOME_FEATURED_COUNT: i64 = 4;

/// Home page payload.
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub page: Option<MarketingPage>,
    pub featured: Vec<Product>,
}

/// Home page: marketing content plus the featured set.
///
/// Both halves degrade independently; a content or catalog outage renders the
/// other half rather than failing the page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Json<HomePage> {
    let page = match state.content() {
        Some(content) => match content.marketing_page_by_slug(HOME_SLUG).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch home page content: {e}");
                None
            }
        },
        None => None,
    };

    let featured = match state.catalog().featured(HOME_FEATURED_COUNT).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!("Failed to fetch featured products: {e}");
            Vec::new()
        }
    };

    Json(HomePage { page, featured })
}
