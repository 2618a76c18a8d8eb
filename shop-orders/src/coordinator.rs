//! Order transaction coordinator.
//!
//! Creates an order atomically: header, stock checks, stock decrements and
//! items either all commit together or none of them do.
//!
//! # Flow
//!
//! ```text
//! NewOrder → validate → begin → header → (lock → check → decrement → item)* → commit
//!                                   └──────────── any failure → rollback ───────┘
//! ```
//!
//! Lines are locked in ascending product id, so two orders touching the same
//! products always acquire their row locks in the same sequence.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use shop_domain::{NewOrder, Order, OrderItem, ValidatedOrder};
use shop_store::{Store, UnitOfWork};

use crate::error::{OrderError, OrderResult};

/// Runs order creation as one unit of work against a store.
pub struct OrderCoordinator<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for OrderCoordinator<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: Store> OrderCoordinator<S> {
    /// Create a new coordinator.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an order, reserving stock for every line.
    ///
    /// Input is validated before the store is touched. Once a unit of work is
    /// open, any failure rolls it back before the error is returned, so a
    /// failed call leaves no header, no items and no stock change behind.
    pub async fn create_order(&self, new_order: NewOrder) -> OrderResult<Order> {
        let order = new_order.validate()?;

        let mut uow = self.store.begin().await?;

        let applied = Self::apply(uow.as_mut(), &order).await;
        match applied {
            Ok(created) => {
                uow.commit().await?;
                info!(
                    order_id = created.id,
                    customer_id = created.customer_id,
                    items = created.items.len(),
                    "Order committed"
                );
                Ok(created)
            },
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    error!(
                        customer_id = order.customer_id,
                        error = %rollback_err,
                        "Rollback failed"
                    );
                }
                Err(err)
            },
        }
    }

    /// Perform every write of the order inside `uow` without committing.
    async fn apply(uow: &mut dyn UnitOfWork, order: &ValidatedOrder) -> OrderResult<Order> {
        let (order_id, created_at) =
            uow.insert_order_header(order.customer_id, order.status).await?;

        let mut items = Vec::with_capacity(order.lines.len());
        for line in order.lines_in_lock_order() {
            let available = uow.lock_and_read_stock(line.product_id).await?;
            debug!(order_id, product_id = line.product_id, available, "Product locked");

            let requested = line.quantity.get();
            if available < requested {
                warn!(
                    order_id,
                    product_id = line.product_id,
                    available,
                    requested,
                    "Insufficient stock, aborting order"
                );
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    available,
                    requested,
                });
            }

            uow.decrement_stock(line.product_id, line.quantity).await?;
            let item_id = uow.insert_order_item(order_id, line.product_id, line.quantity).await?;

            items.push(OrderItem {
                id: item_id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        Ok(Order {
            id: order_id,
            customer_id: order.customer_id,
            status: order.status,
            created_at,
            items,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
