//! Read-only order projections and the administrative status assignment.

use common::{AccountId, Money, OrderId, OrderStatus, ShopperIdentity};
use store::{OrderLineRecord, OrderRecord, OrderStore};

use crate::error::OrdersError;

/// An order together with its frozen lines.
#[derive(Debug, Clone)]
pub struct OrderWithLines {
    pub order: OrderRecord,
    pub lines: Vec<OrderLineRecord>,
}

/// Service for order history and administration.
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The caller's orders, most recent first. Anonymous shoppers have no
    /// order history.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        identity: &ShopperIdentity,
    ) -> Result<Vec<OrderRecord>, OrdersError> {
        match identity.account_id() {
            Some(account_id) => Ok(self.store.orders_for_account(account_id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Loads one of the caller's orders with its lines. Orders belonging to
    /// anyone else are indistinguishable from missing ones.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        identity: &ShopperIdentity,
        order_id: OrderId,
    ) -> Result<OrderWithLines, OrdersError> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .filter(|order| identity.account_id() == Some(order.account_id))
            .ok_or(OrdersError::NotFound(order_id))?;

        let lines = self.store.order_lines(order_id).await?;
        Ok(OrderWithLines { order, lines })
    }

    /// Assigns a status to one order. Administrative; deliberately no
    /// transition validation.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersError> {
        let order = self.store.set_order_status(order_id, status).await?;
        tracing::info!(%order_id, status = %status, "order status assigned");
        Ok(order)
    }

    /// Assigns a status to a batch of orders, skipping unknown IDs the way
    /// a bulk update does. Returns the orders actually updated.
    #[tracing::instrument(skip(self, order_ids))]
    pub async fn set_status_bulk(
        &self,
        order_ids: &[OrderId],
        status: OrderStatus,
    ) -> Result<Vec<OrderRecord>, OrdersError> {
        let mut updated = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            match self.store.set_order_status(order_id, status).await {
                Ok(order) => updated.push(order),
                Err(store::StoreError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(updated)
    }

    /// Sum of the account's delivered order totals.
    #[tracing::instrument(skip(self))]
    pub async fn total_spent(&self, account_id: AccountId) -> Result<Money, OrdersError> {
        Ok(self.store.delivered_total(account_id).await?)
    }
}
