//! Query-side read models for the storefront.
//!
//! Views are fed from the event store by a [`ProjectionProcessor`] and answer
//! the listing questions the aggregates cannot: the admin order board, a
//! customer's order history, catalog stock levels and which carts have gone
//! idle.

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{
    CartActivity, CartActivityView, CustomerOrders, CustomerOrdersView, OrderBoardView, OrderPage,
    OrderSummary, StockLevel, StockLevelsView,
};
