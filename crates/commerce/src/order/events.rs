//! Order domain events.
//!
//! Events carry quantities, unit prices and charges only. Subtotals and
//! totals are derived when reading an order, never recorded.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::pricing::OrderCharges;
use crate::value_objects::CustomerId;

use super::{
    AdminNote, CustomerInfo, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress, TrackingInfo,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    OrderPlaced(OrderPlacedData),
    OrderStatusChanged(OrderStatusChangedData),
    OrderCancelled(OrderCancelledData),
    PaymentUpdated(PaymentUpdatedData),
    TrackingUpdated(TrackingUpdatedData),
    AdminNoteAdded(AdminNoteAddedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::OrderStatusChanged(_) => "OrderStatusChanged",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
            OrderEvent::PaymentUpdated(_) => "PaymentUpdated",
            OrderEvent::TrackingUpdated(_) => "TrackingUpdated",
            OrderEvent::AdminNoteAdded(_) => "AdminNoteAdded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,
    pub order_number: String,

    /// Absent for guest checkouts.
    pub customer_id: Option<CustomerId>,

    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<OrderLine>,
    pub charges: OrderCharges,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedData {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub from: OrderStatus,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdatedData {
    pub status: PaymentStatus,
    pub method: Option<PaymentMethod>,
    pub transaction_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingUpdatedData {
    pub tracking: TrackingInfo,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminNoteAddedData {
    pub note: AdminNote,
}

impl OrderEvent {
    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::OrderStatusChanged(OrderStatusChangedData {
            from,
            to,
            changed_at: Utc::now(),
        })
    }

    pub fn order_cancelled(from: OrderStatus, reason: impl Into<String>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            from,
            reason: reason.into(),
            cancelled_at: Utc::now(),
        })
    }

    pub fn payment_updated(
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        transaction_ref: Option<String>,
    ) -> Self {
        OrderEvent::PaymentUpdated(PaymentUpdatedData {
            status,
            method,
            transaction_ref,
            updated_at: Utc::now(),
        })
    }

    pub fn tracking_updated(tracking: TrackingInfo) -> Self {
        OrderEvent::TrackingUpdated(TrackingUpdatedData {
            tracking,
            updated_at: Utc::now(),
        })
    }

    pub fn admin_note_added(note: impl Into<String>) -> Self {
        OrderEvent::AdminNoteAdded(AdminNoteAddedData {
            note: AdminNote {
                note: note.into(),
                added_at: Utc::now(),
            },
        })
    }
}
