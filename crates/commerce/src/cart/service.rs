//! Cart service: per-customer cart operations against the live catalog.

use chrono::{DateTime, TimeDelta, Utc};
use event_store::{EventStore, EventStoreError};

use crate::catalog::{Catalog, CatalogEntry};
use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::pricing::ShippingPolicy;
use crate::value_objects::{CustomerId, LineItemId, ProductId};

use super::{AddToCart, Cart, CartSummary};

/// Cart operations for customers, reading product data through `C`.
///
/// Every mutation appends to the customer's cart stream at the version it
/// was loaded at, so concurrent updates to one cart never lose writes.
pub struct CartService<S: EventStore, C: Catalog> {
    handler: CommandHandler<S, Cart>,
    catalog: C,
    shipping: ShippingPolicy,
}

impl<S: EventStore, C: Catalog> CartService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
            shipping: ShippingPolicy::default(),
        }
    }

    pub fn with_shipping_policy(mut self, shipping: ShippingPolicy) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn shipping_policy(&self) -> &ShippingPolicy {
        &self.shipping
    }

    /// Loads the customer's cart, or an empty one if it was never opened.
    pub async fn get_cart(&self, customer_id: CustomerId) -> Result<Cart, DomainError> {
        self.handler.load(Cart::id_for(&customer_id)).await
    }

    /// Returns the customer's cart, opening it on first use.
    ///
    /// Two callers racing to open the same cart both succeed: the loser of
    /// the append simply reads the winner's cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, customer_id: CustomerId) -> Result<CartSummary, DomainError> {
        let cart_id = Cart::id_for(&customer_id);
        let cart = match self
            .handler
            .execute_with_snapshot(cart_id, |cart| Ok(cart.open(customer_id)))
            .await
        {
            Ok(result) => result.aggregate,
            Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {
                tracing::debug!("cart opened concurrently");
                self.handler.load(cart_id).await?
            }
            Err(e) => return Err(e),
        };
        self.summarize(customer_id, &cart).await
    }

    #[tracing::instrument(skip(self, item), fields(sku = %item.sku, quantity = item.quantity))]
    pub async fn add_item(
        &self,
        customer_id: CustomerId,
        item: AddToCart,
    ) -> Result<CartSummary, DomainError> {
        let entry = self.catalog.require(&item.sku).await?;
        let specification = item.normalized_specification();

        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| {
                cart.add_item(customer_id, &entry, specification, item.quantity)
            })
            .await?;

        record_mutation("add_item");
        self.summarize(customer_id, &result.aggregate).await
    }

    /// Sets a line's quantity; zero or less removes it.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        customer_id: CustomerId,
        line_id: LineItemId,
        quantity: i64,
    ) -> Result<CartSummary, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| {
                cart.update_quantity(line_id, quantity)
            })
            .await?;

        record_mutation("update_item");
        self.summarize(customer_id, &result.aggregate).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: CustomerId,
        line_id: LineItemId,
    ) -> Result<CartSummary, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| cart.remove_item(line_id))
            .await?;

        record_mutation("remove_item");
        self.summarize(customer_id, &result.aggregate).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, customer_id: CustomerId) -> Result<CartSummary, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| Ok(cart.clear()))
            .await?;

        record_mutation("clear");
        self.summarize(customer_id, &result.aggregate).await
    }

    /// Merges items (e.g. from a guest cart) into the customer's cart.
    ///
    /// Every product is checked against the catalog first; one unknown or
    /// unavailable product rejects the whole merge.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn merge(
        &self,
        customer_id: CustomerId,
        items: Vec<AddToCart>,
    ) -> Result<CartSummary, DomainError> {
        let mut resolved = Vec::with_capacity(items.len());
        for item in &items {
            let entry = self.catalog.require(&item.sku).await?;
            resolved.push((entry, item.normalized_specification(), item.quantity));
        }

        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| {
                cart.merge(customer_id, &resolved)
            })
            .await?;

        record_mutation("merge");
        self.summarize(customer_id, &result.aggregate).await
    }

    /// Replaces stale line snapshots with current catalog data.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_prices(&self, customer_id: CustomerId) -> Result<CartSummary, DomainError> {
        let cart = self.get_cart(customer_id).await?;
        let live = self.live_entries(&cart).await?;

        let result = self
            .handler
            .execute_with_snapshot(Cart::id_for(&customer_id), |cart| {
                Ok(cart.refresh_prices(&live))
            })
            .await?;

        if !result.events.is_empty() {
            tracing::info!(refreshed = result.events.len(), "cart snapshots refreshed");
            record_mutation("refresh_prices");
        }
        Ok(CartSummary::build(
            customer_id,
            &result.aggregate,
            &live,
            &self.shipping,
        ))
    }

    /// Empties every candidate cart idle for longer than the retention
    /// window as of `now`. Returns how many carts were expired.
    ///
    /// A cart that changes while being purged is left alone.
    #[tracing::instrument(skip(self, candidates))]
    pub async fn purge_idle_carts(
        &self,
        candidates: impl IntoIterator<Item = CustomerId>,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let max_idle = TimeDelta::days(Cart::IDLE_LIMIT_DAYS);
        let mut purged = 0;

        for customer_id in candidates {
            let outcome = self
                .handler
                .execute_with_snapshot(Cart::id_for(&customer_id), |cart| {
                    Ok(cart.expire(now, max_idle))
                })
                .await;

            match outcome {
                Ok(result) if !result.events.is_empty() => purged += 1,
                Ok(_) => {}
                Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {
                    tracing::debug!(%customer_id, "cart touched during purge, skipped");
                }
                Err(e) => return Err(e),
            }
        }

        metrics::counter!("carts_purged_total").increment(purged as u64);
        tracing::info!(purged, "idle carts purged");
        Ok(purged)
    }

    /// Builds the summary view, comparing snapshots to live prices.
    pub async fn summarize(
        &self,
        customer_id: CustomerId,
        cart: &Cart,
    ) -> Result<CartSummary, DomainError> {
        let live = self.live_entries(cart).await?;
        Ok(CartSummary::build(customer_id, cart, &live, &self.shipping))
    }

    async fn live_entries(&self, cart: &Cart) -> Result<Vec<CatalogEntry>, DomainError> {
        let mut skus: Vec<&ProductId> = cart.lines().iter().map(|line| &line.sku).collect();
        skus.sort();
        skus.dedup();

        let mut entries = Vec::with_capacity(skus.len());
        for sku in skus {
            if let Some(entry) = self.catalog.lookup(sku).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

fn record_mutation(operation: &'static str) {
    metrics::counter!("cart_mutations_total", "operation" => operation).increment(1);
}
