//! Product catalog repository.
//!
//! The public listing is de-duplicated by `name` (size variants collapse to
//! one card); the admin listing shows every row.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use oxcart_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{CategoryCount, Product, ProductSize};

const PRODUCT_COLUMNS: &str = "id, name, slug, category, brand, description, images, price, \
     stock, rating, num_reviews, is_featured, banner, size, created_at";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first (the default).
    #[default]
    Newest,
    /// Cheapest first (`lowest`).
    PriceAsc,
    /// Most expensive first (`highest`).
    PriceDesc,
    /// Best rated first (`rating`).
    Rating,
}

impl ProductSort {
    /// Map the query-string value to a sort order; unknown values fall back
    /// to newest-first.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("lowest") => Self::PriceAsc,
            Some("highest") => Self::PriceDesc,
            Some("rating") => Self::Rating,
            _ => Self::Newest,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC",
            Self::PriceAsc => "price ASC",
            Self::PriceDesc => "price DESC",
            Self::Rating => "rating DESC",
        }
    }
}

/// Filters for the product search.
///
/// `all` in the query string means "no filter" and is mapped to `None` by the
/// route layer before this struct is built.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub category: Option<String>,
    pub price_range: Option<(Decimal, Decimal)>,
    pub min_rating: Option<Decimal>,
    pub sort: ProductSort,
}

/// Parse a `lo-hi` price range (e.g. `50-100`).
#[must_use]
pub fn parse_price_range(raw: &str) -> Option<(Decimal, Decimal)> {
    let (lo, hi) = raw.split_once('-')?;
    let lo: Decimal = lo.trim().parse().ok()?;
    let hi: Decimal = hi.trim().parse().ok()?;
    (lo <= hi).then_some((lo, hi))
}

/// Fields accepted when creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub images: Vec<String>,
    pub price: Money,
    pub stock: i32,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub size: Option<String>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Latest products, one per name, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM (
                 SELECT DISTINCT ON (name) {PRODUCT_COLUMNS}
                 FROM products
                 ORDER BY name, created_at DESC
             ) p
             ORDER BY created_at DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_featured
             ORDER BY created_at DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Size variants (size + slug) for products whose name matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sizes_by_name(&self, name: &str) -> Result<Vec<ProductSize>, RepositoryError> {
        let sizes = sqlx::query_as::<_, ProductSize>(
            "SELECT size, slug FROM products WHERE name ILIKE $1 ORDER BY size NULLS FIRST",
        )
        .bind(format!("%{name}%"))
        .fetch_all(self.pool)
        .await?;

        Ok(sizes)
    }

    /// Public product search: filtered, sorted, de-duplicated by name,
    /// paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM (
                 SELECT DISTINCT ON (name) {PRODUCT_COLUMNS}
                 FROM products WHERE TRUE"
        ));

        push_filters(&mut qb, filter);

        qb.push(" ORDER BY name, created_at DESC ) p ORDER BY ");
        qb.push(filter.sort.order_by());
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Admin product list: every row (variants included), sorted, paginated,
    /// optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admin(
        &self,
        name_contains: Option<&str>,
        sort: ProductSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = name_contains.map(|q| format!("%{q}%"));

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE $1::text IS NULL OR name ILIKE $1
             ORDER BY {}
             LIMIT $2 OFFSET $3",
            sort.order_by()
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Categories with their product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, count(*) AS count FROM products GROUP BY category ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products
                 (name, slug, category, brand, description, images, price, stock,
                  is_featured, banner, size)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(&input.description)
        .bind(&input.images)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.is_featured)
        .bind(&input.banner)
        .bind(&input.size)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET name = $1, slug = $2, category = $3, brand = $4, description = $5,
                 images = $6, price = $7, stock = $8, is_featured = $9, banner = $10,
                 size = $11
             WHERE id = $12
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(&input.description)
        .bind(&input.images)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.is_featured)
        .bind(&input.banner)
        .bind(&input.size)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(name) = &filter.name_contains {
        qb.push(" AND name ILIKE ");
        qb.push_bind(format!("%{name}%"));
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category.clone());
    }
    if let Some((lo, hi)) = filter.price_range {
        qb.push(" AND price >= ");
        qb.push_bind(lo);
        qb.push(" AND price <= ");
        qb.push_bind(hi);
    }
    if let Some(rating) = filter.min_rating {
        qb.push(" AND rating >= ");
        qb.push_bind(rating);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_query() {
        assert_eq!(ProductSort::from_query(Some("lowest")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::from_query(Some("highest")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_query(Some("rating")), ProductSort::Rating);
        assert_eq!(ProductSort::from_query(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_query(None), ProductSort::Newest);
    }

    #[test]
    fn test_parse_price_range() {
        assert_eq!(
            parse_price_range("50-100"),
            Some((Decimal::from(50), Decimal::from(100)))
        );
        assert_eq!(
            parse_price_range("0-25.50"),
            Some((Decimal::ZERO, Decimal::new(2550, 2)))
        );
    }

    #[test]
    fn test_parse_price_range_rejects_garbage() {
        assert_eq!(parse_price_range("100"), None);
        assert_eq!(parse_price_range("abc-def"), None);
        // Inverted bounds would match nothing; reject them up front
        assert_eq!(parse_price_range("100-50"), None);
    }
}
