//! Product aggregate: catalog data plus the stock ledger for one SKU.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::value_objects::{Money, ProductId};

use super::{CatalogError, ListProduct, ProductEvent, ProductListedData};

/// A sellable item.
///
/// Stock never goes below zero and `in_stock` is false exactly when stock is
/// zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    sku: ProductId,
    name: String,
    localized_name: Option<String>,
    category: String,
    image: Option<String>,
    price: Money,
    stock: u32,
    in_stock: bool,
    listed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Product {
    type Event = ProductEvent;
    type Error = CatalogError;

    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ProductEvent::ProductListed(data) => {
                self.id = Some(data.product_id);
                self.sku = data.sku;
                self.name = data.name;
                self.localized_name = data.localized_name;
                self.category = data.category;
                self.image = data.image;
                self.price = data.price;
                self.stock = data.initial_stock;
                self.listed_at = Some(data.listed_at);
                self.updated_at = Some(data.listed_at);
            }
            ProductEvent::ProductRepriced(data) => {
                self.price = data.new_price;
                self.updated_at = Some(data.repriced_at);
            }
            ProductEvent::StockReplenished(data) => {
                self.stock = self.stock.saturating_add(data.quantity);
                self.updated_at = Some(data.replenished_at);
            }
            ProductEvent::StockDecremented(data) => {
                self.stock = self.stock.saturating_sub(data.quantity);
                self.updated_at = Some(data.decremented_at);
            }
        }
        self.in_stock = self.stock > 0;
    }
}

impl Product {
    /// Stream id of the product with this SKU.
    pub fn id_for(sku: &ProductId) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), sku.as_str())
    }

    pub fn sku(&self) -> &ProductId {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn localized_name(&self) -> Option<&str> {
        self.localized_name.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub fn listed_at(&self) -> Option<DateTime<Utc>> {
        self.listed_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Product {
    /// Fails with `ProductNotFound` unless the product has been listed.
    pub fn require_listed(&self, sku: &ProductId) -> Result<(), CatalogError> {
        if self.id.is_none() {
            return Err(CatalogError::ProductNotFound { sku: sku.clone() });
        }
        Ok(())
    }

    pub fn list(&self, cmd: ListProduct) -> Result<Vec<ProductEvent>, CatalogError> {
        if self.id.is_some() {
            return Err(CatalogError::ProductAlreadyListed { sku: cmd.sku });
        }
        if !cmd.price.is_positive() {
            return Err(CatalogError::InvalidPrice { price: cmd.price });
        }

        Ok(vec![ProductEvent::ProductListed(ProductListedData {
            product_id: Self::id_for(&cmd.sku),
            sku: cmd.sku,
            name: cmd.name,
            localized_name: cmd.localized_name,
            category: cmd.category,
            image: cmd.image,
            price: cmd.price,
            initial_stock: cmd.stock,
            listed_at: Utc::now(),
        })])
    }

    /// Changes the unit price. Setting the current price records nothing.
    pub fn reprice(&self, new_price: Money) -> Result<Vec<ProductEvent>, CatalogError> {
        if !new_price.is_positive() || !new_price.is_within_limit() {
            return Err(CatalogError::InvalidPrice { price: new_price });
        }
        if new_price == self.price {
            return Ok(vec![]);
        }
        Ok(vec![ProductEvent::product_repriced(self.price, new_price)])
    }

    pub fn restock(&self, quantity: u32) -> Result<Vec<ProductEvent>, CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity { quantity });
        }
        Ok(vec![ProductEvent::stock_replenished(quantity, None)])
    }

    /// Records an out-of-band purchase: removes up to `quantity` units,
    /// stopping at zero.
    pub fn track_purchase(&self, quantity: u32) -> Result<Vec<ProductEvent>, CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity { quantity });
        }
        let removed = quantity.min(self.stock);
        Ok(vec![ProductEvent::stock_decremented(removed, quantity, None)])
    }

    /// Takes `quantity` units for an order. Fails rather than overselling.
    pub fn reserve(
        &self,
        order_id: AggregateId,
        quantity: u32,
    ) -> Result<Vec<ProductEvent>, CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity { quantity });
        }
        if !self.in_stock || self.stock < quantity {
            return Err(CatalogError::OutOfStock {
                sku: self.sku.clone(),
                requested: quantity,
                available: self.stock,
            });
        }
        Ok(vec![ProductEvent::stock_decremented(
            quantity,
            quantity,
            Some(order_id),
        )])
    }

    /// Returns units taken by a cancelled order.
    pub fn release(
        &self,
        order_id: AggregateId,
        quantity: u32,
    ) -> Result<Vec<ProductEvent>, CatalogError> {
        if quantity == 0 {
            return Ok(vec![]);
        }
        Ok(vec![ProductEvent::stock_replenished(quantity, Some(order_id))])
    }
}
