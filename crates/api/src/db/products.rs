//! Product repository.
//!
//! Besides plain catalog CRUD, this module owns the only two operations that
//! ever touch `products.stock`: [`ProductRepository::decrement_stock`] and
//! [`ProductRepository::increment_stock`]. Both are single conditional
//! `UPDATE` statements, so the check and the write happen atomically inside
//! the database; the application never does a read-compare-write cycle on
//! stock. They take a generic executor so the order service can run them on
//! a transaction.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, postgres::PgExecutor};

use protech_core::ProductId;

use super::RepositoryError;
use crate::models::{Product, ProductDraft};

/// Database row for a product.
#[derive(Debug, FromRow)]
pub(super) struct ProductRow {
    id: i32,
    name: String,
    brand: String,
    category: String,
    description: String,
    price: Decimal,
    stock: i32,
    images: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand,
            category: row.category,
            description: row.description,
            price: row.price,
            stock: row.stock,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, category, description, price, stock, images, created_at, updated_at";

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

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by ID on an arbitrary executor (e.g. inside a transaction).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_on<'e, E>(
        executor: E,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO products (name, brand, category, description, price, stock, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(&draft.brand)
        .bind(&draft.category)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(&draft.images)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a product's catalog fields.
    ///
    /// Note this includes `stock`: catalog management may restock or correct
    /// inventory directly, which is a different concern from the order
    /// service's reservation traffic.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE products
            SET name = $2, brand = $3, category = $4, description = $5,
                price = $6, stock = $7, images = $8, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.brand)
        .bind(&draft.category)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(&draft.images)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    /// Order line items keep their snapshots; their product reference is
    /// nulled by the foreign key.
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

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Atomically reserve `quantity` units of stock.
    ///
    /// Returns `true` if the decrement was applied, `false` if the product
    /// does not exist or has insufficient stock (zero rows matched the
    /// `stock >= quantity` guard). The caller distinguishes the two cases
    /// with a follow-up read.
    ///
    /// Two concurrent calls for the same product serialize on the row lock;
    /// the guard re-evaluates against the committed value, so stock can
    /// never go negative regardless of interleaving or process count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn decrement_stock<'e, E>(
        executor: E,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically restore `quantity` units of stock (order cancellation).
    ///
    /// Returns `true` if a row was updated, `false` if the product no longer
    /// exists (deleted from the catalog after the order was placed - the
    /// units are simply gone, which is fine).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_stock<'e, E>(
        executor: E,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock + $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
