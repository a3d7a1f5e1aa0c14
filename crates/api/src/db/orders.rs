//! Order repository.
//!
//! Order rows and their line-item snapshots are written together inside the
//! caller's transaction; reads reassemble them into [`Order`] domain values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, postgres::PgExecutor};

use protech_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrderItem, Order, OrderItem, ShippingAddress};

/// A fully-computed order ready to be persisted.
///
/// Built by the order service after validation, stock reservation, and
/// server-side pricing. Every monetary field here is final.
#[derive(Debug)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: UserId,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub items: Vec<NewOrderItem>,
}

/// Database row for an order.
#[derive(Debug, FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    payment_method: String,
    ship_full_name: String,
    ship_phone: String,
    ship_email: String,
    ship_address: String,
    ship_city: String,
    ship_postal_code: Option<String>,
    ship_country: String,
    subtotal: Decimal,
    shipping: Decimal,
    tax: Decimal,
    total: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            items,
            shipping_address: ShippingAddress {
                full_name: self.ship_full_name,
                phone: self.ship_phone,
                email: self.ship_email,
                address: self.ship_address,
                city: self.ship_city,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            payment_method: self.payment_method,
            subtotal: self.subtotal,
            shipping: self.shipping,
            tax: self.tax,
            total: self.total,
            status: self.status,
            payment_status: self.payment_status,
            paid_at: self.paid_at,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        }
    }
}

/// Database row for a line-item snapshot.
#[derive(Debug, FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: Option<i32>,
    name: String,
    price: Decimal,
    quantity: i32,
    image: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id.map(ProductId::new),
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            image: row.image,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, payment_method, \
     ship_full_name, ship_phone, ship_email, ship_address, ship_city, \
     ship_postal_code, ship_country, \
     subtotal, shipping, tax, total, status, payment_status, \
     paid_at, delivered_at, created_at";

const ITEM_COLUMNS: &str = "order_id, product_id, name, price, quantity, image";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its line-item snapshots on the given transaction
    /// connection.
    ///
    /// The caller owns the transaction: stock decrements, this insert, and
    /// the commit form one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        conn: &mut PgConnection,
        new: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders (order_number, user_id, payment_method,
                ship_full_name, ship_phone, ship_email, ship_address,
                ship_city, ship_postal_code, ship_country,
                subtotal, shipping, tax, total,
                status, payment_status, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&new.order_number)
        .bind(new.user_id)
        .bind(&new.payment_method)
        .bind(&new.shipping_address.full_name)
        .bind(&new.shipping_address.phone)
        .bind(&new.shipping_address.email)
        .bind(&new.shipping_address.address)
        .bind(&new.shipping_address.city)
        .bind(&new.shipping_address.postal_code)
        .bind(&new.shipping_address.country)
        .bind(new.subtotal)
        .bind(new.shipping)
        .bind(new.tax)
        .bind(new.total)
        .bind(OrderStatus::Processing)
        .bind(new.payment_status)
        .bind(new.paid_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order number collision".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let item_row: OrderItemRow = sqlx::query_as(&format!(
                r"
                INSERT INTO order_items (order_id, product_id, name, price, quantity, image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(&item.image)
            .fetch_one(&mut *conn)
            .await?;

            items.push(item_row.into());
        }

        Ok(row.into_order(items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = Self::items_for(self.pool, row.id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// Get an order with its items, locking the order row for update.
    ///
    /// Used by status transitions so that two concurrent cancellations of
    /// the same order serialize: the second one re-reads the committed
    /// `cancelled` status and fails validation instead of restoring stock
    /// twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = Self::items_for(&mut *conn, row.id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List all orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Apply a status change on the given executor.
    ///
    /// Optional fields are only written when provided; existing values are
    /// preserved otherwise. Transition validation is the order service's
    /// job - this method just writes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn apply_status<'e, E>(
        executor: E,
        id: OrderId,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
        paid_at: Option<DateTime<Utc>>,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2,
                payment_status = COALESCE($3, payment_status),
                paid_at = COALESCE($4, paid_at),
                delivered_at = COALESCE($5, delivered_at),
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .bind(paid_at)
        .bind(delivered_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete an order (administrative purge).
    ///
    /// Line items cascade. Stock is deliberately untouched: purging is a
    /// bookkeeping operation, not a cancellation.
    ///
    /// Returns `true` if the order was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Total revenue over all orders. Zero when there are none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Decimal, RepositoryError> {
        let revenue: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(total), 0) FROM orders")
                .fetch_one(self.pool)
                .await?;

        Ok(revenue)
    }

    /// Order counts grouped by fulfillment status. Absent statuses are
    /// simply missing from the result; the caller fills in zeros.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(
        &self,
    ) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        Ok(rows)
    }

    /// Fetch items for a single order.
    async fn items_for<'e, E>(executor: E, order_id: i32) -> Result<Vec<OrderItem>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Attach items to a batch of order rows with one query.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item_row in item_rows {
            by_order
                .entry(item_row.order_id)
                .or_default()
                .push(item_row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}
