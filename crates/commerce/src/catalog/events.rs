//! Product domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{Money, ProductId};

/// Events recorded on a product stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProductEvent {
    /// Product was added to the catalog.
    ProductListed(ProductListedData),

    /// Unit price changed.
    ProductRepriced(ProductRepricedData),

    /// Units were added back to stock (restock or cancelled order).
    StockReplenished(StockReplenishedData),

    /// Units were taken out of stock (order placement or tracked purchase).
    StockDecremented(StockDecrementedData),
}

impl DomainEvent for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductListed(_) => "ProductListed",
            ProductEvent::ProductRepriced(_) => "ProductRepriced",
            ProductEvent::StockReplenished(_) => "StockReplenished",
            ProductEvent::StockDecremented(_) => "StockDecremented",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListedData {
    pub product_id: AggregateId,
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub category: String,
    pub image: Option<String>,
    pub price: Money,
    pub initial_stock: u32,
    pub listed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRepricedData {
    pub old_price: Money,
    pub new_price: Money,
    pub repriced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReplenishedData {
    pub quantity: u32,

    /// Set when the units come back from a cancelled order.
    pub order_id: Option<AggregateId>,

    pub replenished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDecrementedData {
    /// Units actually removed; never more than the stock on hand.
    pub quantity: u32,

    /// Units the caller asked for.
    pub requested: u32,

    /// Set when the units were consumed by an order.
    pub order_id: Option<AggregateId>,

    pub decremented_at: DateTime<Utc>,
}

impl ProductEvent {
    pub fn product_repriced(old_price: Money, new_price: Money) -> Self {
        ProductEvent::ProductRepriced(ProductRepricedData {
            old_price,
            new_price,
            repriced_at: Utc::now(),
        })
    }

    pub fn stock_replenished(quantity: u32, order_id: Option<AggregateId>) -> Self {
        ProductEvent::StockReplenished(StockReplenishedData {
            quantity,
            order_id,
            replenished_at: Utc::now(),
        })
    }

    pub fn stock_decremented(quantity: u32, requested: u32, order_id: Option<AggregateId>) -> Self {
        ProductEvent::StockDecremented(StockDecrementedData {
            quantity,
            requested,
            order_id,
            decremented_at: Utc::now(),
        })
    }
}
