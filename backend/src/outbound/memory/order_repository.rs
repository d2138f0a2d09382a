//! In-process order storage, unique on the order number.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::orders::{Order, OrderCreation, OrderNumber};
use crate::domain::ports::{OrderRepository, OrderRepositoryError};

/// [`OrderRepository`] backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<OrderNumber, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OrderNumber, Order>> {
        match self.orders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_or_get(&self, order: &Order) -> Result<OrderCreation, OrderRepositoryError> {
        let mut orders = self.lock();
        if let Some(existing) = orders.get(order.order_number()) {
            return Ok(OrderCreation::Existing(existing.clone()));
        }
        orders.insert(order.order_number().clone(), order.clone());
        Ok(OrderCreation::Created(order.clone()))
    }

    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self.lock().get(order_number).cloned())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn order(amount_cents: i64) -> Order {
        Order::new(
            Uuid::new_v4(),
            OrderNumber::new("A-1").expect("valid number"),
            amount_cents,
            Utc::now(),
        )
        .expect("valid order")
    }

    #[tokio::test]
    async fn second_insert_returns_the_first_order() {
        let repo = InMemoryOrderRepository::new();
        let first = order(100);

        let created = repo.create_or_get(&first).await.expect("insert");
        let existing = repo.create_or_get(&order(200)).await.expect("insert");

        assert_eq!(created, OrderCreation::Created(first.clone()));
        assert_eq!(existing, OrderCreation::Existing(first));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn find_by_order_number_reads_back() {
        let repo = InMemoryOrderRepository::new();
        let stored = order(100);
        repo.create_or_get(&stored).await.expect("insert");

        let found = repo
            .find_by_order_number(stored.order_number())
            .await
            .expect("lookup");
        let missing = repo
            .find_by_order_number(&OrderNumber::new("B-2").expect("valid number"))
            .await
            .expect("lookup");

        assert_eq!(found, Some(stored));
        assert!(missing.is_none());
    }
}
