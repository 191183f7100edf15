//! Cart domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{CustomerId, LineItemId, ProductId};

use super::PriceSnapshot;

/// Events recorded on a cart stream.
///
/// Every event carries its timestamp, which becomes the cart's last
/// activity time when applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    CartOpened(CartOpenedData),
    LineItemAdded(LineItemAddedData),
    LineItemQuantityChanged(LineItemQuantityChangedData),
    LineItemRemoved(LineItemRemovedData),

    /// A line's snapshot was replaced with current catalog data.
    LineSnapshotRefreshed(LineSnapshotRefreshedData),

    CartCleared(CartClearedData),

    /// The cart sat idle past the retention window and was emptied.
    CartExpired(CartExpiredData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartOpened(_) => "CartOpened",
            CartEvent::LineItemAdded(_) => "LineItemAdded",
            CartEvent::LineItemQuantityChanged(_) => "LineItemQuantityChanged",
            CartEvent::LineItemRemoved(_) => "LineItemRemoved",
            CartEvent::LineSnapshotRefreshed(_) => "LineSnapshotRefreshed",
            CartEvent::CartCleared(_) => "CartCleared",
            CartEvent::CartExpired(_) => "CartExpired",
        }
    }
}

impl CartEvent {
    /// When the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::CartOpened(d) => d.opened_at,
            CartEvent::LineItemAdded(d) => d.added_at,
            CartEvent::LineItemQuantityChanged(d) => d.changed_at,
            CartEvent::LineItemRemoved(d) => d.removed_at,
            CartEvent::LineSnapshotRefreshed(d) => d.refreshed_at,
            CartEvent::CartCleared(d) => d.cleared_at,
            CartEvent::CartExpired(d) => d.expired_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartOpenedData {
    pub cart_id: AggregateId,
    pub customer_id: CustomerId,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemAddedData {
    pub line_id: LineItemId,
    pub sku: ProductId,
    pub specification: String,
    pub quantity: u32,
    pub snapshot: PriceSnapshot,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemQuantityChangedData {
    pub line_id: LineItemId,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRemovedData {
    pub line_id: LineItemId,
    pub removed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshotRefreshedData {
    pub line_id: LineItemId,
    pub snapshot: PriceSnapshot,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartClearedData {
    pub cleared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartExpiredData {
    /// Last activity before expiry.
    pub idle_since: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl CartEvent {
    pub fn cart_opened(cart_id: AggregateId, customer_id: CustomerId) -> Self {
        CartEvent::CartOpened(CartOpenedData {
            cart_id,
            customer_id,
            opened_at: Utc::now(),
        })
    }

    pub fn line_item_added(
        sku: ProductId,
        specification: String,
        quantity: u32,
        snapshot: PriceSnapshot,
    ) -> Self {
        CartEvent::LineItemAdded(LineItemAddedData {
            line_id: LineItemId::new(),
            sku,
            specification,
            quantity,
            snapshot,
            added_at: Utc::now(),
        })
    }

    pub fn quantity_changed(line_id: LineItemId, old_quantity: u32, new_quantity: u32) -> Self {
        CartEvent::LineItemQuantityChanged(LineItemQuantityChangedData {
            line_id,
            old_quantity,
            new_quantity,
            changed_at: Utc::now(),
        })
    }

    pub fn line_item_removed(line_id: LineItemId) -> Self {
        CartEvent::LineItemRemoved(LineItemRemovedData {
            line_id,
            removed_at: Utc::now(),
        })
    }

    pub fn snapshot_refreshed(line_id: LineItemId, snapshot: PriceSnapshot) -> Self {
        CartEvent::LineSnapshotRefreshed(LineSnapshotRefreshedData {
            line_id,
            snapshot,
            refreshed_at: Utc::now(),
        })
    }

    pub fn cart_cleared() -> Self {
        CartEvent::CartCleared(CartClearedData {
            cleared_at: Utc::now(),
        })
    }

    pub fn cart_expired(idle_since: DateTime<Utc>, expired_at: DateTime<Utc>) -> Self {
        CartEvent::CartExpired(CartExpiredData {
            idle_since,
            expired_at,
        })
    }
}
