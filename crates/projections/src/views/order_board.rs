//! Admin order board: every order, newest first, filterable by status.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commerce::{
    Aggregate, CustomerId, Money, Order, OrderEvent, OrderLine, OrderStatus, PaymentMethod,
    PaymentStatus, Pricing,
};
use common::AggregateId;
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_if};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub item_count: u32,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of the board.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub page: usize,
    pub per_page: usize,
    /// Matching orders across all pages.
    pub total: usize,
}

#[derive(Default)]
struct BoardState {
    orders: HashMap<AggregateId, OrderSummary>,
    position: ProjectionPosition,
}

#[derive(Clone, Default)]
pub struct OrderBoardView {
    state: Arc<RwLock<BoardState>>,
}

impl OrderBoardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, order_id: AggregateId) -> Option<OrderSummary> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// Lists orders newest first. Pages are 1-based; page 0 is read as 1 and
    /// `per_page` is at least 1.
    pub async fn list(&self, status: Option<OrderStatus>, page: usize, per_page: usize) -> OrderPage {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let state = self.state.read().await;
        let mut matching: Vec<&OrderSummary> = state
            .orders
            .values()
            .filter(|order| status.is_none_or(|wanted| order.status == wanted))
            .collect();
        matching.sort_by(|a, b| {
            b.placed_at
                .cmp(&a.placed_at)
                .then_with(|| b.order_number.cmp(&a.order_number))
        });

        let total = matching.len();
        let orders = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        OrderPage {
            orders,
            page,
            per_page,
            total,
        }
    }

    pub async fn count_by_status(&self, status: OrderStatus) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .filter(|order| order.status == status)
            .count()
    }
}

#[async_trait]
impl Projection for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let decoded: Option<OrderEvent> = decode_if(event, Order::aggregate_type())?;
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        let Some(order_event) = decoded else {
            return Ok(());
        };
        let order_id = event.aggregate_id;

        if let OrderEvent::OrderPlaced(data) = &order_event {
            let subtotal: Money = data.lines.iter().map(OrderLine::line_total).sum();
            let summary = OrderSummary {
                order_id,
                order_number: data.order_number.clone(),
                customer_id: data.customer_id,
                customer_name: data.customer.name.clone(),
                email: data.customer.email.clone(),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                payment_method: data.payment_method,
                item_count: data.lines.iter().map(|line| line.quantity).sum(),
                total: Pricing::compute(subtotal, &data.charges).total,
                placed_at: data.placed_at,
                updated_at: data.placed_at,
            };
            state.orders.insert(order_id, summary);
            return Ok(());
        }

        let Some(summary) = state.orders.get_mut(&order_id) else {
            tracing::warn!(%order_id, event_type = %event.event_type, "event for unknown order skipped");
            return Ok(());
        };
        summary.updated_at = event.timestamp;
        match order_event {
            OrderEvent::OrderStatusChanged(data) => summary.status = data.to,
            OrderEvent::OrderCancelled(_) => summary.status = OrderStatus::Cancelled,
            OrderEvent::PaymentUpdated(data) => {
                summary.payment_status = data.status;
                if let Some(method) = data.method {
                    summary.payment_method = method;
                }
            }
            OrderEvent::OrderPlaced(_)
            | OrderEvent::TrackingUpdated(_)
            | OrderEvent::AdminNoteAdded(_) => {}
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = BoardState::default();
        Ok(())
    }
}

impl ReadModel for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.orders.len()).unwrap_or(0)
    }
}
