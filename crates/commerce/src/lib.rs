//! Storefront commerce core.
//!
//! This crate holds the consistency rules of the store:
//! - Product catalog and stock ledger, one event stream per SKU
//! - Customer carts with frozen price snapshots and derived totals
//! - Orders with server-side pricing and a status state machine
//! - Atomic multi-stream commits so stock is never oversold
//! - Outbound notifications that never block a committed change

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod error;
pub mod notify;
pub mod order;
pub mod pricing;
pub mod unit_of_work;
pub mod validation;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use cart::{AddToCart, Cart, CartError, CartEvent, CartService, CartSummary};
pub use catalog::{
    Catalog, CatalogEntry, CatalogError, CatalogService, ListProduct, Product, ProductEvent,
};
pub use command::{CommandHandler, CommandResult};
pub use error::{DomainError, ErrorKind};
pub use notify::{InMemoryNotifier, LogNotifier, Notification, Notifier, NotifyError};
pub use order::{
    AdminUpdate, CheckoutCart, CustomerInfo, Order, OrderError, OrderEvent, OrderLine,
    OrderService, OrderStatus, PaymentMethod, PaymentStatus, PaymentUpdate, PlaceOrder,
    PlaceOrderItem, ShippingAddress, TrackingInfo,
};
pub use pricing::{OrderCharges, Pricing, ShippingPolicy};
pub use unit_of_work::UnitOfWork;
pub use validation::{FieldError, ValidationErrors};
pub use value_objects::{CustomerId, LineItemId, Money, ProductId};
