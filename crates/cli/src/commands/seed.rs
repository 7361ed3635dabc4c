//! Catalog seeding command.
//!
//! Inserts a small sample catalog (including one size-variant family) for
//! local development. Existing slugs are left alone.

use oxcart_core::Money;
use oxcart_server::db::{ProductInput, ProductRepository, RepositoryError};

use super::CommandError;

fn sample_products() -> Vec<ProductInput> {
    let shirt = |size: &str, slug: &str, stock: i32| ProductInput {
        name: "Classic Oxford Shirt".to_owned(),
        slug: slug.to_owned(),
        category: "Shirts".to_owned(),
        brand: "Oxcart".to_owned(),
        description: "A crisp oxford shirt in breathable cotton.".to_owned(),
        images: vec!["/images/oxford-shirt.jpg".to_owned()],
        price: Money::from_cents(59_95),
        stock,
        is_featured: false,
        banner: None,
        size: Some(size.to_owned()),
    };

    vec![
        shirt("S", "classic-oxford-shirt-s", 8),
        shirt("M", "classic-oxford-shirt-m", 12),
        shirt("L", "classic-oxford-shirt-l", 5),
        ProductInput {
            name: "Selvedge Denim Jeans".to_owned(),
            slug: "selvedge-denim-jeans".to_owned(),
            category: "Jeans".to_owned(),
            brand: "Oxcart".to_owned(),
            description: "Raw selvedge denim with a classic straight cut.".to_owned(),
            images: vec!["/images/selvedge-jeans.jpg".to_owned()],
            price: Money::from_cents(129_00),
            stock: 10,
            is_featured: true,
            banner: Some("/images/banner-jeans.jpg".to_owned()),
            size: None,
        },
        ProductInput {
            name: "Merino Wool Beanie".to_owned(),
            slug: "merino-wool-beanie".to_owned(),
            category: "Accessories".to_owned(),
            brand: "Oxcart".to_owned(),
            description: "Soft merino beanie for cold mornings.".to_owned(),
            images: vec!["/images/merino-beanie.jpg".to_owned()],
            price: Money::from_cents(24_50),
            stock: 30,
            is_featured: true,
            banner: None,
            size: None,
        },
        ProductInput {
            name: "Canvas Tote Bag".to_owned(),
            slug: "canvas-tote-bag".to_owned(),
            category: "Accessories".to_owned(),
            brand: "Oxcart".to_owned(),
            description: "Heavy-duty canvas tote with internal pocket.".to_owned(),
            images: vec!["/images/canvas-tote.jpg".to_owned()],
            price: Money::from_cents(18_00),
            stock: 25,
            is_featured: false,
            banner: None,
            size: None,
        },
    ]
}

/// Seed the database with sample catalog data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;
    let products = ProductRepository::new(&pool);

    let mut inserted = 0usize;
    for input in sample_products() {
        match products.create(&input).await {
            Ok(product) => {
                tracing::info!(slug = %product.slug, "Seeded product");
                inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(slug = %input.slug, "Already present, skipping");
            }
            Err(RepositoryError::Database(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(slug = %input.slug, "Skipping product: {e}");
            }
        }
    }

    tracing::info!(inserted, "Seeding complete");
    Ok(())
}
