//! Order service: the single entry point used by the request layer.

use std::sync::Arc;
use tracing::info;

use shop_domain::{CustomerId, NewOrder, Order, OrderId, OrderStatus, UserId};
use shop_store::Store;

use crate::coordinator::OrderCoordinator;
use crate::error::{OrderError, OrderResult};
use crate::query::OrderQueryService;

/// Order operations exposed to callers.
pub struct OrderService<S: Store> {
    store: Arc<S>,
    coordinator: OrderCoordinator<S>,
    queries: OrderQueryService<S>,
}

impl<S: Store> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            coordinator: self.coordinator.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<S: Store> OrderService<S> {
    /// Create a service over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            coordinator: OrderCoordinator::new(store.clone()),
            queries: OrderQueryService::new(store.clone()),
            store,
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create an order atomically. See [`OrderCoordinator::create_order`].
    pub async fn create_order(&self, new_order: NewOrder) -> OrderResult<Order> {
        self.coordinator.create_order(new_order).await
    }

    /// Get an order with its items.
    pub async fn get_order_by_id(&self, id: OrderId) -> OrderResult<Order> {
        self.queries.get_order_by_id(id).await
    }

    /// Get the headers of all orders of a customer.
    pub async fn get_orders_by_customer_id(&self, customer_id: CustomerId) -> OrderResult<Vec<Order>> {
        self.queries.get_orders_by_customer_id(customer_id).await
    }

    /// Resolve the user that owns an order.
    pub async fn get_owner_id(&self, order_id: OrderId) -> OrderResult<UserId> {
        self.queries.get_owner_id(order_id).await
    }

    /// Overwrite an order's status and return the refreshed order.
    ///
    /// A plain single-row write: no row lock is taken and no transition rules
    /// are enforced.
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> OrderResult<Order> {
        let updated = self.store.orders().update_order_status(id, status).await?;
        if !updated {
            return Err(OrderError::not_found("order", id));
        }

        info!(order_id = id, status = %status, "Order status updated");
        self.queries.get_order_by_id(id).await
    }
}
