//! Admin product management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use oxcart_core::{Money, ProductId};

use crate::db::{ProductInput, ProductRepository, ProductSort};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::Product;
use crate::routes::{ActionResponse, PAGE_SIZE, Paginated};
use crate::state::AppState;

/// Query parameters for the admin product list.
#[derive(Debug, Deserialize)]
pub struct AdminProductQuery {
    pub page: Option<i64>,
    pub query: Option<String>,
    pub sort: Option<String>,
}

/// Product create/update payload.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub images: Vec<String>,
    pub price: Money,
    pub stock: i32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

const MIN_TEXT_LENGTH: usize = 3;
const MAX_TEXT_LENGTH: usize = 255;
const MAX_DESCRIPTION_LENGTH: usize = 500;

fn validate_product_form(form: &ProductForm) -> std::result::Result<(), String> {
    let texts = [
        ("name", &form.name),
        ("slug", &form.slug),
        ("category", &form.category),
        ("brand", &form.brand),
    ];
    for (field, value) in texts {
        let len = value.trim().len();
        if !(MIN_TEXT_LENGTH..=MAX_TEXT_LENGTH).contains(&len) {
            return Err(format!(
                "{field} must be between {MIN_TEXT_LENGTH} and {MAX_TEXT_LENGTH} characters"
            ));
        }
    }

    let description_len = form.description.trim().len();
    if !(MIN_TEXT_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&description_len) {
        return Err(format!(
            "description must be between {MIN_TEXT_LENGTH} and {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }

    if form.images.is_empty() {
        return Err("product must have at least 1 image".to_owned());
    }
    if form.stock < 0 {
        return Err("stock cannot be negative".to_owned());
    }
    if form.price.amount().is_sign_negative() || form.price.is_zero() {
        return Err("price must be positive".to_owned());
    }

    Ok(())
}

impl From<ProductForm> for ProductInput {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name.trim().to_owned(),
            slug: form.slug.trim().to_owned(),
            category: form.category.trim().to_owned(),
            brand: form.brand.trim().to_owned(),
            description: form.description.trim().to_owned(),
            images: form.images,
            price: form.price,
            stock: form.stock,
            is_featured: form.is_featured,
            banner: form.banner,
            size: form.size,
        }
    }
}

/// Full product list (every size variant), sorted and paginated.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<AdminProductQuery>,
) -> Result<Json<Paginated<Product>>> {
    let products = ProductRepository::new(state.pool());

    let page = query.page.unwrap_or(1).max(1);
    let filter = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty() && *q != "all");

    let data = products
        .list_admin(
            filter,
            ProductSort::from_query(query.sort.as_deref()),
            PAGE_SIZE,
            (page - 1) * PAGE_SIZE,
        )
        .await?;
    let total = products.count().await?;

    Ok(Json(Paginated::new(data, total, PAGE_SIZE)))
}

/// Create a product.
#[instrument(skip(state, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(form): Json<ProductForm>,
) -> Result<Json<ActionResponse>> {
    validate_product_form(&form).map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .create(&form.into())
        .await?;

    tracing::info!(product_id = %product.id, "Product created");

    Ok(Json(ActionResponse::ok("Product was created")))
}

/// Update a product.
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
    Json(form): Json<ProductForm>,
) -> Result<Json<ActionResponse>> {
    validate_product_form(&form).map_err(AppError::BadRequest)?;

    ProductRepository::new(state.pool())
        .update(id, &form.into())
        .await?;

    Ok(Json(ActionResponse::ok("Product was updated")))
}

/// Delete a product.
#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ActionResponse>> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    Ok(Json(ActionResponse::ok("Product was deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "Linen Shirt".to_owned(),
            slug: "linen-shirt".to_owned(),
            category: "Shirts".to_owned(),
            brand: "Oxcart".to_owned(),
            description: "A breathable linen shirt.".to_owned(),
            images: vec!["/images/linen-shirt.jpg".to_owned()],
            price: Money::from_cents(49_99),
            stock: 10,
            is_featured: false,
            banner: None,
            size: Some("M".to_owned()),
        }
    }

    #[test]
    fn test_validate_product_form_ok() {
        assert!(validate_product_form(&form()).is_ok());
    }

    #[test]
    fn test_validate_product_form_short_name() {
        let mut f = form();
        f.name = "ab".to_owned();
        assert!(validate_product_form(&f).is_err());
    }

    #[test]
    fn test_validate_product_form_requires_image() {
        let mut f = form();
        f.images.clear();
        assert!(validate_product_form(&f).is_err());
    }

    #[test]
    fn test_validate_product_form_rejects_free_products() {
        let mut f = form();
        f.price = Money::ZERO;
        assert!(validate_product_form(&f).is_err());
    }

    #[test]
    fn test_validate_product_form_rejects_negative_stock() {
        let mut f = form();
        f.stock = -1;
        assert!(validate_product_form(&f).is_err());
    }
}
