//! Catalog service: product administration and the stock ledger.

use async_trait::async_trait;
use event_store::EventStore;

use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::value_objects::{Money, ProductId};

use super::{Catalog, CatalogEntry, ListProduct, Product};

/// Lists, reprices and restocks products, and records out-of-band purchases.
pub struct CatalogService<S: EventStore> {
    handler: CommandHandler<S, Product>,
}

impl<S: EventStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, cmd), fields(sku = %cmd.sku))]
    pub async fn list_product(&self, cmd: ListProduct) -> Result<Product, DomainError> {
        cmd.validate()?;
        let id = Product::id_for(&cmd.sku);

        let result = self.handler.execute(id, |product| product.list(cmd)).await?;
        tracing::info!(price = %result.aggregate.price(), stock = result.aggregate.stock(), "product listed");
        Ok(result.aggregate)
    }

    #[tracing::instrument(skip(self, sku), fields(sku = %sku))]
    pub async fn reprice(&self, sku: &ProductId, price: Money) -> Result<Product, DomainError> {
        let result = self
            .handler
            .execute(Product::id_for(sku), |product| {
                product.require_listed(sku)?;
                product.reprice(price)
            })
            .await?;
        Ok(result.aggregate)
    }

    #[tracing::instrument(skip(self, sku), fields(sku = %sku))]
    pub async fn restock(&self, sku: &ProductId, quantity: u32) -> Result<Product, DomainError> {
        let result = self
            .handler
            .execute(Product::id_for(sku), |product| {
                product.require_listed(sku)?;
                product.restock(quantity)
            })
            .await?;
        Ok(result.aggregate)
    }

    /// Decrements stock for a purchase made outside the order flow, stopping
    /// at zero.
    #[tracing::instrument(skip(self, sku), fields(sku = %sku))]
    pub async fn track_purchase(
        &self,
        sku: &ProductId,
        quantity: u32,
    ) -> Result<Product, DomainError> {
        let result = self
            .handler
            .execute(Product::id_for(sku), |product| {
                product.require_listed(sku)?;
                product.track_purchase(quantity)
            })
            .await?;

        metrics::counter!("stock_decrements_total", "source" => "tracked_purchase").increment(1);
        if !result.aggregate.in_stock() {
            tracing::info!("product sold out");
        }
        Ok(result.aggregate)
    }

    /// Loads a product by SKU.
    #[tracing::instrument(skip(self, sku), fields(sku = %sku))]
    pub async fn get_product(&self, sku: &ProductId) -> Result<Option<Product>, DomainError> {
        self.handler.load_existing(Product::id_for(sku)).await
    }
}

#[async_trait]
impl<S: EventStore> Catalog for CatalogService<S> {
    async fn lookup(&self, sku: &ProductId) -> Result<Option<CatalogEntry>, DomainError> {
        Ok(self
            .get_product(sku)
            .await?
            .map(|product| CatalogEntry::from(&product)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::error::ErrorKind;
    use event_store::{InMemoryEventStore, Version};

    fn service() -> CatalogService<InMemoryEventStore> {
        CatalogService::new(InMemoryEventStore::new())
    }

    fn mala() -> ListProduct {
        ListProduct::new("MALA-108", "Rudraksha Mala", "Malas", Money::from_units(500), 10)
    }

    #[tokio::test]
    async fn list_then_lookup() {
        let catalog = service();
        catalog.list_product(mala()).await.unwrap();

        let entry = catalog
            .require(&ProductId::new("MALA-108"))
            .await
            .unwrap();
        assert_eq!(entry.name, "Rudraksha Mala");
        assert_eq!(entry.price, Money::from_units(500));
        assert_eq!(entry.stock, 10);
        assert!(entry.available);
        assert_eq!(entry.version, Version::first());
    }

    #[tokio::test]
    async fn duplicate_listing_conflicts() {
        let catalog = service();
        catalog.list_product(mala()).await.unwrap();

        let err = catalog.list_product(mala()).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::ProductAlreadyListed { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn invalid_listing_reports_fields() {
        let err = service()
            .list_product(ListProduct::new("", "", "Malas", Money::from_units(-1), 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation_errors().unwrap().errors().len(), 3);
    }

    #[tokio::test]
    async fn operations_on_unknown_products_are_not_found() {
        let catalog = service();
        let sku = ProductId::new("UNKNOWN");

        let err = catalog.restock(&sku, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(catalog.lookup(&sku).await.unwrap().is_none());
        assert!(catalog.get_product(&sku).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ledger_operations_bump_the_revision() {
        let catalog = service();
        let sku = ProductId::new("MALA-108");
        catalog.list_product(mala()).await.unwrap();

        catalog.reprice(&sku, Money::from_units(550)).await.unwrap();
        catalog.restock(&sku, 5).await.unwrap();
        let product = catalog.track_purchase(&sku, 20).await.unwrap();

        assert_eq!(product.stock(), 0);
        assert!(!product.in_stock());

        let entry = catalog.require(&sku).await.unwrap();
        assert_eq!(entry.price, Money::from_units(550));
        assert_eq!(entry.version, Version::new(4));
        assert!(!entry.available);
    }
}
