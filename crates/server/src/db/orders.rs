//! Order ledger repository.
//!
//! The one place in the system needing cross-entity consistency: order
//! creation, payment confirmation, and admin status transitions each run in
//! a single transaction. Stock commitment is guarded twice - by the
//! transition table (edge-gated) and by the persisted `inventory_applied`
//! latch, claimed with a conditional update so a replayed approval can
//! never decrement twice. Every decrement is conditioned on
//! `quantity >= n`; a line that would go negative aborts the whole
//! transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use charkha_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Phone, PinCode, ProductId,
    UserId,
};

use super::RepositoryError;
use crate::models::{Address, Order, OrderItem, OrderTotals};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    gateway_order_ref: Option<String>,
    inventory_applied: bool,
    subtotal: Decimal,
    shipping: Decimal,
    cod_fee: Decimal,
    total: Decimal,
    ship_name: String,
    ship_line1: String,
    ship_line2: Option<String>,
    ship_city: String,
    ship_state: String,
    ship_pincode: String,
    ship_phone: String,
    archived_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let pin_code = PinCode::parse(&self.ship_pincode).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid PIN code in database: {e}"))
        })?;
        let phone = Phone::parse(&self.ship_phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            items,
            address: Address {
                full_name: self.ship_name,
                line1: self.ship_line1,
                line2: self.ship_line2,
                city: self.ship_city,
                state: self.ship_state,
                pin_code,
                phone,
            },
            order_status: self.order_status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            gateway_order_ref: self.gateway_order_ref,
            inventory_applied: self.inventory_applied,
            subtotal: self.subtotal,
            shipping: self.shipping,
            cod_fee: self.cod_fee,
            total: self.total,
            archived_at: self.archived_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    name: String,
    image: Option<String>,
    size: String,
    color: String,
    quantity: i32,
    unit_price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} on order item {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            image: row.image,
            size: row.size,
            color: row.color,
            quantity,
            unit_price: row.unit_price,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, order_status, payment_status, payment_method, \
     gateway_order_ref, inventory_applied, subtotal, shipping, cod_fee, total, \
     ship_name, ship_line1, ship_line2, ship_city, ship_state, ship_pincode, ship_phone, \
     archived_at, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, name, image, size, color, quantity, unit_price";

// =============================================================================
// Repository
// =============================================================================

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

    /// Persist a new `Pending`/`Unpaid` order with its snapshotted items,
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// is written in that case.
    pub async fn create(
        &self,
        user_id: UserId,
        items: Vec<OrderItem>,
        address: Address,
        payment_method: PaymentMethod,
        totals: OrderTotals,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders
                (id, user_id, order_status, payment_status, payment_method,
                 subtotal, shipping, cod_fee, total,
                 ship_name, ship_line1, ship_line2, ship_city, ship_state,
                 ship_pincode, ship_phone)
            VALUES ($1, $2, 'pending', 'unpaid', $3,
                    $4, $5, $6, $7,
                    $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            ",
        ))
        .bind(OrderId::generate().as_uuid())
        .bind(user_id.as_uuid())
        .bind(payment_method)
        .bind(totals.subtotal)
        .bind(totals.shipping)
        .bind(totals.cod_fee)
        .bind(totals.total)
        .bind(&address.full_name)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(address.pin_code.as_str())
        .bind(address.phone.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (id, order_id, product_id, name, image, size, color,
                     quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(item.id.as_uuid())
            .bind(row.id)
            .bind(item.product_id.as_uuid())
            .bind(&item.name)
            .bind(&item.image)
            .bind(&item.size)
            .bind(&item.color)
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.into_order(items)
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1",
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(&[row.id]).await?.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(items)?))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        ))
        .bind(user_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List all orders, newest first (admin surface).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            ",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Store the payment gateway's order reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_gateway_ref(
        &self,
        id: OrderId,
        gateway_order_ref: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET gateway_order_ref = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(gateway_order_ref)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Compensating action: a just-created order whose gateway order could
    /// not be created is moved to `Failed` instead of lingering `Pending`.
    ///
    /// Conditioned on the order still being `Pending`, so a late-arriving
    /// verification can't be clobbered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_failed(&self, id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE orders
            SET order_status = 'failed', updated_at = NOW()
            WHERE id = $1 AND order_status = 'pending'
            ",
        )
        .bind(id.as_uuid())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a verified payment: `payment_status` becomes `Paid`, the order
    /// moves `Pending -> Processing`, and stock is committed - one
    /// transaction.
    ///
    /// Calling this again for an already-paid order is a no-op returning the
    /// current state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::InvalidTransition` if the order is not in a
    /// payable state.
    /// Returns `RepositoryError::InsufficientStock` (rolling everything
    /// back) if any line can no longer be covered.
    pub async fn confirm_payment(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = Self::lock_order(&mut tx, id).await?;

        if row.payment_status == PaymentStatus::Paid {
            let items = Self::load_items_tx(&mut tx, row.id).await?;
            tx.commit().await?;
            return row.into_order(items);
        }

        let from = row.order_status;
        let to = OrderStatus::Processing;
        if !from.can_transition_to(to) {
            return Err(RepositoryError::InvalidTransition { from, to });
        }

        let items = Self::load_items_tx(&mut tx, row.id).await?;
        if from.commits_inventory(to) {
            Self::apply_inventory(&mut tx, id, &items).await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders
            SET order_status = $2, payment_status = 'paid', updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            ",
        ))
        .bind(id.as_uuid())
        .bind(to)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_order(items)
    }

    /// Admin-driven status transition, validated against the transition
    /// table. A same-status call is a no-op. Stock is committed when (and
    /// only when) the edge enters a committed status for the first time;
    /// entering `Completed` stamps `archived_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::InvalidTransition` for edges outside the
    /// table.
    /// Returns `RepositoryError::InsufficientStock` (rolling everything
    /// back) if stock commitment fails.
    pub async fn transition(
        &self,
        id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = Self::lock_order(&mut tx, id).await?;
        let from = row.order_status;

        if from == to {
            let items = Self::load_items_tx(&mut tx, row.id).await?;
            tx.commit().await?;
            return row.into_order(items);
        }

        if !from.can_transition_to(to) {
            return Err(RepositoryError::InvalidTransition { from, to });
        }

        let items = Self::load_items_tx(&mut tx, row.id).await?;
        if from.commits_inventory(to) {
            Self::apply_inventory(&mut tx, id, &items).await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders
            SET order_status = $2,
                archived_at = CASE WHEN $2 = 'completed'::order_status THEN NOW()
                                   ELSE archived_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            ",
        ))
        .bind(id.as_uuid())
        .bind(to)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_order(items)
    }

    /// Delete orders archived before `cutoff`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_archived_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM orders
            WHERE order_status = 'completed' AND archived_at < $1
            ",
        )
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Lock an order row for the duration of the transaction.
    async fn lock_order(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
    ) -> Result<OrderRow, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE",
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Commit an order's stock, exactly once.
    ///
    /// Claims the `inventory_applied` latch with a conditional update; a
    /// zero-row claim means a previous transaction already applied this
    /// order and the decrements are skipped. Each decrement is itself
    /// conditional on sufficient stock; a failed line aborts the caller's
    /// transaction, rolling back the latch and every prior decrement.
    async fn apply_inventory(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let claimed = sqlx::query(
            r"
            UPDATE orders
            SET inventory_applied = TRUE
            WHERE id = $1 AND NOT inventory_applied
            ",
        )
        .bind(id.as_uuid())
        .execute(&mut **tx)
        .await?;

        if claimed.rows_affected() == 0 {
            // Already applied by an earlier transition
            return Ok(());
        }

        for item in items {
            let quantity = i32::try_from(item.quantity).unwrap_or(i32::MAX);
            let result = sqlx::query(
                r"
                UPDATE products
                SET quantity = quantity - $2,
                    in_stock = quantity - $2 > 0,
                    updated_at = NOW()
                WHERE id = $1 AND quantity >= $2
                ",
            )
            .bind(item.product_id.as_uuid())
            .bind(quantity)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::InsufficientStock(item.product_id));
            }
        }

        Ok(())
    }

    async fn load_items_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY created_at ASC",
        ))
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    async fn load_items(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) \
             ORDER BY created_at ASC",
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }

        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }
}
