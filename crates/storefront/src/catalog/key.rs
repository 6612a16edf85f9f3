//! Catalog query parameters and deterministic cache-key construction.
//!
//! Two logically identical queries must map to the same key and any parameter
//! change must produce a different key, so every field is emitted in a fixed
//! order with an unambiguous encoding: values are percent-encoded and an
//! absent value renders as `∅`, which percent-encoding can never produce.

use crate::shopify::types::ProductSortKey;

/// Marker for an absent parameter, distinct from any encoded value.
const ABSENT: &str = "∅";

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Structured product-listing filter, compiled to the upstream query
/// mini-language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Free-text search, matched against titles.
    pub text: Option<String>,
    /// Exact product type.
    pub product_type: Option<String>,
    /// Only products available for sale.
    pub in_stock: bool,
}

impl ProductFilter {
    /// Compile the filter into an upstream query string, `None` when empty.
    #[must_use]
    pub fn to_query(&self) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            parts.push(format!("title:*{}*", text.replace('"', "\\\"")));
        }
        if let Some(product_type) = self.product_type.as_deref().filter(|t| !t.is_empty()) {
            parts.push(format!("product_type:{}", quote_if_needed(product_type)));
        }
        if self.in_stock {
            parts.push("available_for_sale:true".to_string());
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" AND "))
        }
    }
}

/// Quote a query term when it contains characters the mini-language treats
/// specially.
fn quote_if_needed(value: &str) -> String {
    if value.contains(char::is_whitespace) || value.contains(':') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Cursor paging directive. Forward and backward paging are mutually
/// exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSpec {
    /// Page forward from `after` (or the start).
    Forward { first: i64, after: Option<String> },
    /// Page backward from `before`.
    Backward { last: i64, before: Option<String> },
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::Forward {
            first: DEFAULT_PAGE_SIZE,
            after: None,
        }
    }
}

/// Listing sort orders, mapped to an upstream sort key plus direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Default,
    TitleAsc,
    TitleDesc,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SortOrder {
    /// Parse the storefront's sort parameter; unknown values sort as default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "title-asc" => Self::TitleAsc,
            "title-desc" => Self::TitleDesc,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "newest" => Self::Newest,
            _ => Self::Default,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
        }
    }

    /// Upstream (sort key, reverse) pair for the products query.
    #[must_use]
    pub const fn to_upstream(self) -> (Option<ProductSortKey>, Option<bool>) {
        match self {
            Self::Default => (None, None),
            Self::TitleAsc => (Some(ProductSortKey::Title), Some(false)),
            Self::TitleDesc => (Some(ProductSortKey::Title), Some(true)),
            Self::PriceAsc => (Some(ProductSortKey::Price), Some(false)),
            Self::PriceDesc => (Some(ProductSortKey::Price), Some(true)),
            Self::Newest => (Some(ProductSortKey::CreatedAt), Some(true)),
        }
    }
}

fn part(value: Option<&str>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| urlencoding::encode(v).into_owned())
}

/// Cache key for one product-listing page under the given generation.
#[must_use]
pub fn product_list_key(
    generation: u64,
    filter: &ProductFilter,
    page: &PageSpec,
    sort: SortOrder,
) -> String {
    let (first, after, last, before) = match page {
        PageSpec::Forward { first, after } => {
            (Some(first.to_string()), after.as_deref(), None, None)
        }
        PageSpec::Backward { last, before } => {
            (None, None, Some(last.to_string()), before.as_deref())
        }
    };

    format!(
        "products:v{generation}:first={}|after={}|last={}|before={}|q={}|type={}|stock={}|sort={}",
        part(first.as_deref()),
        part(after),
        part(last.as_deref()),
        part(before),
        part(filter.text.as_deref()),
        part(filter.product_type.as_deref()),
        u8::from(filter.in_stock),
        sort.as_str(),
    )
}

/// Cache key for the featured set under the given generation.
#[must_use]
pub fn featured_key(generation: u64, count: i64) -> String {
    format!("featured:v{generation}:count={count}")
}

/// Cache key for a single product point lookup.
///
/// Not generation-versioned: point lookups are addressed by stable handle and
/// invalidated by direct deletion.
#[must_use]
pub fn product_handle_key(handle: &str) -> String {
    format!("product:{}", urlencoding::encode(handle))
}
