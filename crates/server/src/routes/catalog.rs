//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{ProductFilter, ProductRepository, ProductSort, products::parse_price_range};
use crate::error::{AppError, Result};
use crate::models::{CategoryCount, Product, ProductSize};
use crate::routes::{PAGE_SIZE, Paginated};
use crate::state::AppState;

/// How many latest products the home page shows.
const LATEST_PRODUCTS_LIMIT: i64 = 8;

/// How many featured products the home banner shows.
const FEATURED_PRODUCTS_LIMIT: i64 = 4;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub query: Option<String>,
    pub category: Option<String>,
    /// `lo-hi` price range, e.g. `25-100`.
    pub price: Option<String>,
    /// Minimum rating, e.g. `4`.
    pub rating: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
}

fn none_if_all(value: Option<&String>) -> Option<&str> {
    value
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "all")
}

impl ProductListQuery {
    fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            name_contains: none_if_all(self.query.as_ref()).map(str::to_owned),
            category: none_if_all(self.category.as_ref()).map(str::to_owned),
            price_range: none_if_all(self.price.as_ref()).and_then(parse_price_range),
            min_rating: none_if_all(self.rating.as_ref()).and_then(|r| r.parse().ok()),
            sort: ProductSort::from_query(self.sort.as_deref()),
        }
    }

    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Browse/search products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<Product>>> {
    let products = ProductRepository::new(state.pool());
    let filter = query.to_filter();
    let offset = (query.page() - 1) * PAGE_SIZE;

    let data = products.search(&filter, PAGE_SIZE, offset).await?;
    let total = products.count().await?;

    Ok(Json(Paginated::new(data, total, PAGE_SIZE)))
}

/// Latest products for the home page.
#[instrument(skip(state))]
pub async fn latest(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .latest(LATEST_PRODUCTS_LIMIT)
        .await?;
    Ok(Json(products))
}

/// Featured products for the home banner.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .featured(FEATURED_PRODUCTS_LIMIT)
        .await?;
    Ok(Json(products))
}

/// Product detail with its size variants.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    /// Sibling size variants (products sharing this name).
    pub sizes: Vec<ProductSize>,
}

/// Show a single product by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let products = ProductRepository::new(state.pool());

    let product = products
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let sizes = products.sizes_by_name(&product.name).await?;

    Ok(Json(ProductDetail { product, sizes }))
}

/// Categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}
