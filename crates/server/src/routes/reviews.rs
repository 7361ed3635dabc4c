//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use oxcart_core::ProductId;

use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireUser;
use crate::models::{Review, ReviewWithAuthor};
use crate::routes::ActionResponse;
use crate::state::AppState;

/// Review payload.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    pub title: String,
    pub description: String,
}

/// Minimum length of review title and description.
const MIN_TEXT_LENGTH: usize = 3;

fn validate_review(request: &ReviewRequest) -> std::result::Result<(), String> {
    if !(1..=5).contains(&request.rating) {
        return Err("rating must be between 1 and 5".to_owned());
    }
    if request.title.trim().len() < MIN_TEXT_LENGTH {
        return Err(format!(
            "title must be at least {MIN_TEXT_LENGTH} characters"
        ));
    }
    if request.description.trim().len() < MIN_TEXT_LENGTH {
        return Err(format!(
            "description must be at least {MIN_TEXT_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Reviews for a product, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ReviewWithAuthor>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(reviews))
}

/// The signed-in user's review of a product, plus whether they qualify as a
/// verified purchaser.
#[derive(Debug, Serialize)]
pub struct MyReview {
    pub review: Option<Review>,
    pub has_purchased: bool,
}

/// My review + purchase eligibility for a product.
#[instrument(skip(state, user))]
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<MyReview>> {
    let reviews = ReviewRepository::new(state.pool());

    let review = reviews.get_for_user(user.id, product_id).await?;
    let has_purchased = reviews.has_purchased(user.id, product_id).await?;

    Ok(Json(MyReview {
        review,
        has_purchased,
    }))
}

/// Create or update my review of a product.
///
/// The review lands flagged as a verified purchase when a delivered order of
/// mine contains the product; the product's rating aggregate is recomputed
/// in the same transaction as the write.
#[instrument(skip(state, user, request))]
pub async fn upsert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ActionResponse>> {
    validate_review(&request).map_err(AppError::BadRequest)?;

    // The product must exist before a review can hang off it
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let reviews = ReviewRepository::new(state.pool());
    let has_purchased = reviews.has_purchased(user.id, product_id).await?;

    reviews
        .upsert(
            user.id,
            product_id,
            request.rating,
            request.title.trim(),
            request.description.trim(),
            has_purchased,
        )
        .await?;

    Ok(Json(ActionResponse::ok("Review submitted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i32, title: &str, description: &str) -> ReviewRequest {
        ReviewRequest {
            rating,
            title: title.to_owned(),
            description: description.to_owned(),
        }
    }

    #[test]
    fn test_validate_review_accepts_valid() {
        assert!(validate_review(&request(5, "Great", "Loved it")).is_ok());
    }

    #[test]
    fn test_validate_review_rating_bounds() {
        assert!(validate_review(&request(0, "Great", "Loved it")).is_err());
        assert!(validate_review(&request(6, "Great", "Loved it")).is_err());
        assert!(validate_review(&request(1, "Meh.", "Too small")).is_ok());
    }

    #[test]
    fn test_validate_review_text_lengths() {
        assert!(validate_review(&request(4, "ok", "Loved it")).is_err());
        assert!(validate_review(&request(4, "Great", "no")).is_err());
    }
}
