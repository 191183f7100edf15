use async_trait::async_trait;
use event_store::Version;
use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::value_objects::{Money, ProductId};

use super::{CatalogError, Product};

/// What the cart needs to know about a product at the moment it looks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub category: String,
    pub image: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub available: bool,

    /// Product stream revision the data was read at.
    pub version: Version,
}

impl From<&Product> for CatalogEntry {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku().clone(),
            name: product.name().to_string(),
            localized_name: product.localized_name().map(str::to_string),
            category: product.category().to_string(),
            image: product.image().map(str::to_string),
            price: product.price(),
            stock: product.stock(),
            available: product.in_stock(),
            version: product.version(),
        }
    }
}

/// Read access to the catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches a product by SKU, or None if it was never listed.
    async fn lookup(&self, sku: &ProductId) -> Result<Option<CatalogEntry>, DomainError>;

    /// Like [`Catalog::lookup`], failing with `ProductNotFound` when absent.
    async fn require(&self, sku: &ProductId) -> Result<CatalogEntry, DomainError> {
        self.lookup(sku).await?.ok_or_else(|| {
            CatalogError::ProductNotFound { sku: sku.clone() }.into()
        })
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for std::sync::Arc<T> {
    async fn lookup(&self, sku: &ProductId) -> Result<Option<CatalogEntry>, DomainError> {
        (**self).lookup(sku).await
    }
}
