//! Order aggregate, status machine and checkout.

mod aggregate;
mod commands;
mod details;
mod events;
mod service;
mod status;

pub use aggregate::{DEFAULT_CANCEL_REASON, NewOrder, Order};
pub use commands::{AdminUpdate, CheckoutCart, PaymentUpdate, PlaceOrder, PlaceOrderItem};
pub use details::{
    AdminNote, CustomerInfo, OrderLine, PaymentDetails, ShippingAddress, TrackingInfo,
    order_number,
};
pub use events::{
    AdminNoteAddedData, OrderCancelledData, OrderEvent, OrderPlacedData, OrderStatusChangedData,
    PaymentUpdatedData, TrackingUpdatedData,
};
pub use service::OrderService;
pub use status::{OrderStatus, PaymentMethod, PaymentStatus};

use common::AggregateId;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::value_objects::ProductId;

/// Errors raised by order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {order_id}")]
    NotFound { order_id: AggregateId },

    #[error("Order already placed: {order_id}")]
    AlreadyPlaced { order_id: AggregateId },

    #[error("Order has no items")]
    NoItems,

    #[error("Invalid quantity for {sku} (must be at least 1)")]
    InvalidQuantity { sku: ProductId },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    #[error("Cancellation requires a reason")]
    MissingCancelReason,
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound { .. } => ErrorKind::NotFound,
            OrderError::AlreadyPlaced { .. } => ErrorKind::Conflict,
            OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::MissingCancelReason => ErrorKind::Validation,
            OrderError::InvalidStateTransition { .. } => ErrorKind::State,
        }
    }
}
