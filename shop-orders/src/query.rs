//! Order read side.

use std::sync::Arc;
use tracing::debug;

use shop_domain::{CustomerId, Order, OrderId, UserId};
use shop_store::Store;

use crate::error::{OrderError, OrderResult};

/// Read-only access to committed orders.
pub struct OrderQueryService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for OrderQueryService<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: Store> OrderQueryService<S> {
    /// Create a new query service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get an order with its items.
    pub async fn get_order_by_id(&self, id: OrderId) -> OrderResult<Order> {
        let mut order = self
            .store
            .orders()
            .fetch_order_header(id)
            .await?
            .ok_or_else(|| OrderError::not_found("order", id))?;

        order.items = self.store.orders().fetch_items_by_order(id).await?;
        debug!(order_id = id, items = order.items.len(), "Order loaded");
        Ok(order)
    }

    /// Get all orders of a customer.
    ///
    /// Only headers are returned: `items` is empty on every order. An unknown
    /// customer yields an empty list.
    pub async fn get_orders_by_customer_id(&self, customer_id: CustomerId) -> OrderResult<Vec<Order>> {
        Ok(self.store.orders().fetch_orders_by_customer(customer_id).await?)
    }

    /// Resolve the user that owns an order.
    pub async fn get_owner_id(&self, order_id: OrderId) -> OrderResult<UserId> {
        self.store
            .orders()
            .resolve_owner_user_id(order_id)
            .await?
            .ok_or_else(|| OrderError::not_found("order", order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::OrderCoordinator;
    use rust_decimal_macros::dec;
    use shop_domain::{NewCustomer, NewOrder, NewOrderItem, NewProduct, OrderStatus, Price};
    use shop_store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        coordinator: OrderCoordinator<MemoryStore>,
        queries: OrderQueryService<MemoryStore>,
        customer_id: CustomerId,
        product_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let customer = NewCustomer {
            user_id: 42,
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            phone_number: "555-0142".to_string(),
        };
        let customer_id = store.customers().insert(&customer).await.unwrap().id;
        let product = NewProduct::new("Kettle", "kitchen", Price::new(dec!(35)).unwrap(), 100).unwrap();
        let product_id = store.products().insert(&product).await.unwrap().id;

        Fixture {
            coordinator: OrderCoordinator::new(store.clone()),
            queries: OrderQueryService::new(store.clone()),
            store,
            customer_id,
            product_id,
        }
    }

    fn single_line(customer_id: CustomerId, product_id: i64, quantity: i32) -> NewOrder {
        NewOrder {
            customer_id,
            status: OrderStatus::Pending,
            items: vec![NewOrderItem { product_id, quantity }],
        }
    }

    #[tokio::test]
    async fn test_get_order_by_id_includes_items() {
        let f = fixture().await;
        let created = f
            .coordinator
            .create_order(single_line(f.customer_id, f.product_id, 2))
            .await
            .unwrap();

        let loaded = f.queries.get_order_by_id(created.id).await.unwrap();
        assert_eq!(loaded, created);

        // Reads are idempotent
        let again = f.queries.get_order_by_id(created.id).await.unwrap();
        assert_eq!(again, loaded);
    }

    #[tokio::test]
    async fn test_customer_orders_are_headers_only() {
        let f = fixture().await;
        let first = f
            .coordinator
            .create_order(single_line(f.customer_id, f.product_id, 1))
            .await
            .unwrap();
        let second = f
            .coordinator
            .create_order(single_line(f.customer_id, f.product_id, 2))
            .await
            .unwrap();

        let orders = f.queries.get_orders_by_customer_id(f.customer_id).await.unwrap();

        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(orders.iter().all(|o| o.items.is_empty()));
        assert_eq!(f.store.item_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_customer_has_no_orders() {
        let f = fixture().await;
        let orders = f.queries.get_orders_by_customer_id(777).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let f = fixture().await;

        let err = f.queries.get_order_by_id(12345).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound { ref entity_type, ref id }
            if entity_type == "order" && id == "12345"));

        let err = f.queries.get_owner_id(12345).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_owner_resolves_through_customer() {
        let f = fixture().await;
        let created = f
            .coordinator
            .create_order(single_line(f.customer_id, f.product_id, 1))
            .await
            .unwrap();

        assert_eq!(f.queries.get_owner_id(created.id).await.unwrap(), 42);
    }
}
