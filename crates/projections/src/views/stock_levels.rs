//! Catalog stock levels for the admin product listing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commerce::{Aggregate, Money, Product, ProductEvent, ProductId};
use common::AggregateId;
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_if};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub category: String,
    pub price: Money,
    pub stock: u32,
    pub in_stock: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct StockState {
    products: HashMap<AggregateId, StockLevel>,
    position: ProjectionPosition,
}

#[derive(Clone, Default)]
pub struct StockLevelsView {
    state: Arc<RwLock<StockState>>,
}

impl StockLevelsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, sku: &ProductId) -> Option<StockLevel> {
        self.state
            .read()
            .await
            .products
            .get(&Product::id_for(sku))
            .cloned()
    }

    /// Every listed product, ordered by SKU.
    pub async fn all(&self) -> Vec<StockLevel> {
        let mut levels: Vec<_> = self.state.read().await.products.values().cloned().collect();
        levels.sort_by(|a, b| a.sku.cmp(&b.sku));
        levels
    }

    /// Products with at most `threshold` units left, emptiest first.
    pub async fn low_stock(&self, threshold: u32) -> Vec<StockLevel> {
        let mut levels: Vec<_> = self
            .state
            .read()
            .await
            .products
            .values()
            .filter(|level| level.stock <= threshold)
            .cloned()
            .collect();
        levels.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.sku.cmp(&b.sku)));
        levels
    }
}

#[async_trait]
impl Projection for StockLevelsView {
    fn name(&self) -> &'static str {
        "StockLevelsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let decoded: Option<ProductEvent> = decode_if(event, Product::aggregate_type())?;
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        let Some(product_event) = decoded else {
            return Ok(());
        };

        if let ProductEvent::ProductListed(data) = product_event {
            state.products.insert(
                event.aggregate_id,
                StockLevel {
                    sku: data.sku,
                    name: data.name,
                    localized_name: data.localized_name,
                    category: data.category,
                    price: data.price,
                    stock: data.initial_stock,
                    in_stock: data.initial_stock > 0,
                    updated_at: data.listed_at,
                },
            );
            return Ok(());
        }

        let Some(level) = state.products.get_mut(&event.aggregate_id) else {
            tracing::warn!(product_id = %event.aggregate_id, "stock event for unlisted product skipped");
            return Ok(());
        };
        match product_event {
            ProductEvent::ProductRepriced(data) => {
                level.price = data.new_price;
                level.updated_at = data.repriced_at;
            }
            ProductEvent::StockReplenished(data) => {
                level.stock = level.stock.saturating_add(data.quantity);
                level.updated_at = data.replenished_at;
            }
            ProductEvent::StockDecremented(data) => {
                level.stock = level.stock.saturating_sub(data.quantity);
                level.updated_at = data.decremented_at;
            }
            ProductEvent::ProductListed(_) => {}
        }
        level.in_stock = level.stock > 0;
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = StockState::default();
        Ok(())
    }
}

impl ReadModel for StockLevelsView {
    fn name(&self) -> &'static str {
        "StockLevelsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.products.len()).unwrap_or(0)
    }
}
