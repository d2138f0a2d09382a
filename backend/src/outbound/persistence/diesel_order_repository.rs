//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! `create_or_get` relies on the unique constraint on `order_number`: the
//! insert does nothing on conflict, and a zero row count means another writer
//! got there first, so the stored order is read back through
//! `find_by_order_number` on a fresh pool checkout.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::orders::{Order, OrderCreation, OrderNumber};
use crate::domain::ports::{OrderRepository, OrderRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewOrderRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::orders;

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn row_to_order(row: OrderRow) -> Result<Order, OrderRepositoryError> {
    let order_number = OrderNumber::new(&row.order_number)
        .map_err(|err| OrderRepositoryError::query(format!("stored order number: {err}")))?;
    Order::new(row.id, order_number, row.amount_cents, row.created_at)
        .map_err(|err| OrderRepositoryError::query(format!("stored order: {err}")))
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create_or_get(&self, order: &Order) -> Result<OrderCreation, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewOrderRow {
            id: order.id(),
            order_number: order.order_number().as_str(),
            amount_cents: order.amount_cents(),
            created_at: order.created_at(),
        };

        let inserted: Option<OrderRow> = diesel::insert_into(orders::table)
            .values(&row)
            .on_conflict(orders::order_number)
            .do_nothing()
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        if let Some(created) = inserted {
            return row_to_order(created).map(OrderCreation::Created);
        }
        drop(conn);

        self.find_by_order_number(order.order_number())
            .await?
            .map(OrderCreation::Existing)
            .ok_or_else(|| {
                OrderRepositoryError::query(format!(
                    "order {} conflicted on insert but could not be read back",
                    order.order_number()
                ))
            })
    }

    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<OrderRow> = orders::table
            .filter(orders::order_number.eq(order_number.as_str()))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_order).transpose()
    }
}
