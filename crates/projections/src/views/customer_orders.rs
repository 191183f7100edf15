//! Per-customer order history and spend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commerce::{Aggregate, CustomerId, Money, Order, OrderEvent, OrderLine, OrderStatus, Pricing};
use common::AggregateId;
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_if};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct CustomerOrders {
    pub customer_id: CustomerId,
    /// Newest first.
    pub order_ids: Vec<AggregateId>,
    pub placed: usize,
    pub active: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Sum of totals of orders currently delivered. A refund takes the order
    /// back out.
    pub total_spent: Money,
}

#[derive(Debug, Clone)]
struct OwnedOrder {
    status: OrderStatus,
    total: Money,
    placed_at: DateTime<Utc>,
}

#[derive(Default)]
struct CustomerOrdersState {
    by_customer: HashMap<CustomerId, Vec<AggregateId>>,
    orders: HashMap<AggregateId, OwnedOrder>,
    position: ProjectionPosition,
}

/// Orders grouped by the customer who placed them. Guest orders are not
/// tracked.
#[derive(Clone, Default)]
pub struct CustomerOrdersView {
    state: Arc<RwLock<CustomerOrdersState>>,
}

impl CustomerOrdersView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the customer's history, or None if they never placed an order.
    pub async fn get(&self, customer_id: CustomerId) -> Option<CustomerOrders> {
        let state = self.state.read().await;
        let ids = state.by_customer.get(&customer_id)?;

        let mut owned: Vec<(AggregateId, &OwnedOrder)> = ids
            .iter()
            .filter_map(|id| state.orders.get(id).map(|order| (*id, order)))
            .collect();
        owned.sort_by(|a, b| b.1.placed_at.cmp(&a.1.placed_at));

        let count = |status: OrderStatus| owned.iter().filter(|(_, o)| o.status == status).count();
        Some(CustomerOrders {
            customer_id,
            order_ids: owned.iter().map(|(id, _)| *id).collect(),
            placed: owned.len(),
            active: owned.iter().filter(|(_, o)| o.status.is_active()).count(),
            delivered: count(OrderStatus::Delivered),
            cancelled: count(OrderStatus::Cancelled),
            total_spent: owned
                .iter()
                .filter(|(_, o)| o.status == OrderStatus::Delivered)
                .map(|(_, o)| o.total)
                .sum(),
        })
    }

    /// Returns whether `order_id` was placed by `customer_id`.
    pub async fn owns(&self, customer_id: CustomerId, order_id: AggregateId) -> bool {
        self.state
            .read()
            .await
            .by_customer
            .get(&customer_id)
            .is_some_and(|ids| ids.contains(&order_id))
    }
}

#[async_trait]
impl Projection for CustomerOrdersView {
    fn name(&self) -> &'static str {
        "CustomerOrdersView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let decoded: Option<OrderEvent> = decode_if(event, Order::aggregate_type())?;
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        let order_id = event.aggregate_id;
        match decoded {
            Some(OrderEvent::OrderPlaced(data)) => {
                let Some(customer_id) = data.customer_id else {
                    return Ok(());
                };
                let subtotal: Money = data.lines.iter().map(OrderLine::line_total).sum();
                state.orders.insert(
                    order_id,
                    OwnedOrder {
                        status: OrderStatus::Pending,
                        total: Pricing::compute(subtotal, &data.charges).total,
                        placed_at: data.placed_at,
                    },
                );
                state.by_customer.entry(customer_id).or_default().push(order_id);
            }
            Some(OrderEvent::OrderStatusChanged(data)) => {
                if let Some(order) = state.orders.get_mut(&order_id) {
                    order.status = data.to;
                }
            }
            Some(OrderEvent::OrderCancelled(_)) => {
                if let Some(order) = state.orders.get_mut(&order_id) {
                    order.status = OrderStatus::Cancelled;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = CustomerOrdersState::default();
        Ok(())
    }
}

impl ReadModel for CustomerOrdersView {
    fn name(&self) -> &'static str {
        "CustomerOrdersView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.by_customer.len()).unwrap_or(0)
    }
}
