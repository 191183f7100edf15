//! Cart activity, used to find carts left idle long enough to expire.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commerce::{Aggregate, Cart, CartEvent, CustomerId, LineItemId};
use common::AggregateId;
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_if};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct CartActivity {
    pub customer_id: CustomerId,
    pub line_count: usize,
    pub item_count: u64,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TrackedCart {
    customer_id: CustomerId,
    lines: HashMap<LineItemId, u32>,
    last_activity: DateTime<Utc>,
}

impl TrackedCart {
    fn activity(&self) -> CartActivity {
        CartActivity {
            customer_id: self.customer_id,
            line_count: self.lines.len(),
            item_count: self.lines.values().map(|&q| u64::from(q)).sum(),
            last_activity: self.last_activity,
        }
    }
}

#[derive(Default)]
struct ActivityState {
    carts: HashMap<AggregateId, TrackedCart>,
    position: ProjectionPosition,
}

#[derive(Clone, Default)]
pub struct CartActivityView {
    state: Arc<RwLock<ActivityState>>,
}

impl CartActivityView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, customer_id: CustomerId) -> Option<CartActivity> {
        self.state
            .read()
            .await
            .carts
            .get(&Cart::id_for(&customer_id))
            .map(TrackedCart::activity)
    }

    /// Owners of non-empty carts untouched since before `cutoff`.
    pub async fn idle_since(&self, cutoff: DateTime<Utc>) -> Vec<CustomerId> {
        self.state
            .read()
            .await
            .carts
            .values()
            .filter(|cart| !cart.lines.is_empty() && cart.last_activity < cutoff)
            .map(|cart| cart.customer_id)
            .collect()
    }
}

#[async_trait]
impl Projection for CartActivityView {
    fn name(&self) -> &'static str {
        "CartActivityView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let decoded: Option<CartEvent> = decode_if(event, Cart::aggregate_type())?;
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        let Some(cart_event) = decoded else {
            return Ok(());
        };
        let at = cart_event.occurred_at();

        if let CartEvent::CartOpened(data) = &cart_event {
            state.carts.insert(
                event.aggregate_id,
                TrackedCart {
                    customer_id: data.customer_id,
                    lines: HashMap::new(),
                    last_activity: at,
                },
            );
            return Ok(());
        }

        let Some(cart) = state.carts.get_mut(&event.aggregate_id) else {
            tracing::warn!(cart_id = %event.aggregate_id, "event for unopened cart skipped");
            return Ok(());
        };
        cart.last_activity = at;
        match cart_event {
            CartEvent::LineItemAdded(data) => {
                cart.lines.insert(data.line_id, data.quantity);
            }
            CartEvent::LineItemQuantityChanged(data) => {
                cart.lines.insert(data.line_id, data.new_quantity);
            }
            CartEvent::LineItemRemoved(data) => {
                cart.lines.remove(&data.line_id);
            }
            CartEvent::CartCleared(_) | CartEvent::CartExpired(_) => cart.lines.clear(),
            CartEvent::CartOpened(_) | CartEvent::LineSnapshotRefreshed(_) => {}
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = ActivityState::default();
        Ok(())
    }
}

impl ReadModel for CartActivityView {
    fn name(&self) -> &'static str {
        "CartActivityView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.carts.len()).unwrap_or(0)
    }
}
