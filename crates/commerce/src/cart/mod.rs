//! Shopping cart aggregate.

mod aggregate;
mod commands;
mod events;
mod line;
mod service;
mod summary;

pub use aggregate::Cart;
pub use commands::AddToCart;
pub use events::{
    CartClearedData, CartEvent, CartExpiredData, CartOpenedData, LineItemAddedData,
    LineItemQuantityChangedData, LineItemRemovedData, LineSnapshotRefreshedData,
};
pub use line::{CartLine, PriceSnapshot};
pub use service::CartService;
pub use summary::{CartLineSummary, CartSummary};

use thiserror::Error;

use crate::error::ErrorKind;
use crate::value_objects::{LineItemId, ProductId};

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Line item not found: {line_id}")]
    LineItemNotFound { line_id: LineItemId },

    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i64 },

    #[error("Product is out of stock: {sku}")]
    OutOfStock { sku: ProductId },

    #[error("Cart is empty")]
    EmptyCart,
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::LineItemNotFound { .. } => ErrorKind::NotFound,
            CartError::InvalidQuantity { .. } | CartError::EmptyCart => ErrorKind::Validation,
            CartError::OutOfStock { .. } => ErrorKind::State,
        }
    }
}
