//! Product catalog and stock ledger.

mod aggregate;
mod commands;
mod events;
mod lookup;
mod service;

pub use aggregate::Product;
pub use commands::ListProduct;
pub use events::{
    ProductEvent, ProductListedData, ProductRepricedData, StockDecrementedData,
    StockReplenishedData,
};
pub use lookup::{Catalog, CatalogEntry};
pub use service::CatalogService;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::value_objects::{Money, ProductId};

/// Errors raised by catalog and stock operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {sku}")]
    ProductNotFound { sku: ProductId },

    #[error("Product already listed: {sku}")]
    ProductAlreadyListed { sku: ProductId },

    #[error("Invalid price: {price} (must be greater than 0 and at most {max})", max = Money::MAX_AMOUNT)]
    InvalidPrice { price: Money },

    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// The product is unavailable, or has fewer units than requested.
    #[error("Out of stock: {sku} (requested {requested}, available {available})")]
    OutOfStock {
        sku: ProductId,
        requested: u32,
        available: u32,
    },
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ProductNotFound { .. } => ErrorKind::NotFound,
            CatalogError::ProductAlreadyListed { .. } => ErrorKind::Conflict,
            CatalogError::InvalidPrice { .. } | CatalogError::InvalidQuantity { .. } => {
                ErrorKind::Validation
            }
            CatalogError::OutOfStock { .. } => ErrorKind::State,
        }
    }
}
