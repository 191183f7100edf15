//! Order service: placement, checkout, status changes and cancellation.

use std::collections::BTreeMap;
use std::time::Instant;

use common::AggregateId;
use event_store::EventStore;

use crate::aggregate::Aggregate;
use crate::cart::{Cart, CartError};
use crate::catalog::{CatalogError, Product};
use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::notify::{Notification, Notifier, dispatch};
use crate::pricing::{OrderCharges, Pricing, ShippingPolicy};
use crate::unit_of_work::UnitOfWork;
use crate::validation::ValidationErrors;
use crate::value_objects::{CustomerId, Money, ProductId};

use super::{
    AdminUpdate, CheckoutCart, DEFAULT_CANCEL_REASON, NewOrder, Order, OrderLine, OrderStatus,
    PlaceOrder, PlaceOrderItem,
};

/// Turns items into priced orders and drives them through their lifecycle.
///
/// Placing an order and taking its stock is one atomic commit across the
/// order stream and every product stream involved, so stock can never be
/// sold twice. Cancelling puts the stock back in the same way.
pub struct OrderService<S: EventStore, N: Notifier> {
    orders: CommandHandler<S, Order>,
    products: CommandHandler<S, Product>,
    carts: CommandHandler<S, Cart>,
    shipping: ShippingPolicy,
    notifier: N,
}

impl<S: EventStore + Clone, N: Notifier> OrderService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            orders: CommandHandler::new(store.clone()),
            products: CommandHandler::new(store.clone()),
            carts: CommandHandler::new(store),
            shipping: ShippingPolicy::default(),
            notifier,
        }
    }

    pub fn with_shipping_policy(mut self, shipping: ShippingPolicy) -> Self {
        self.shipping = shipping;
        self
    }

    /// Places an order for the given items at current catalog prices.
    ///
    /// Fails without recording anything if any product is unknown, sold
    /// out, or has fewer units than requested.
    #[tracing::instrument(skip(self, cmd), fields(items = cmd.items.len(), customer_id = ?cmd.customer_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        cmd.validate()?;
        self.commit_order(cmd, UnitOfWork::new()).await
    }

    /// Places an order from everything in the customer's cart and empties
    /// the cart in the same commit.
    ///
    /// Prices come from the catalog at checkout time, not from the cart's
    /// snapshots.
    #[tracing::instrument(skip(self, details))]
    pub async fn checkout_cart(
        &self,
        customer_id: CustomerId,
        details: CheckoutCart,
    ) -> Result<Order, DomainError> {
        let cart_id = Cart::id_for(&customer_id);
        let mut cart = self.carts.load(cart_id).await?;
        if cart.is_empty() {
            return Err(CartError::EmptyCart.into());
        }

        let items = cart
            .lines()
            .iter()
            .map(|line| PlaceOrderItem {
                sku: line.sku.clone(),
                quantity: line.quantity,
                specification: line.specification.clone(),
            })
            .collect();
        let cmd = PlaceOrder {
            customer_id: Some(customer_id),
            customer: details.customer,
            shipping_address: details.shipping_address,
            items,
            charges: details.charges,
            payment_method: details.payment_method,
            notes: details.notes,
        };
        cmd.validate()?;

        let mut uow = UnitOfWork::new();
        let events = cart.clear();
        uow.record(cart_id, &mut cart, events)?;

        let order = self.commit_order(cmd, uow).await?;
        metrics::counter!("cart_mutations_total", "operation" => "checkout").increment(1);
        Ok(order)
    }

    /// Moves an order to `target`. Cancelling this way restocks like
    /// [`OrderService::cancel_order`].
    #[tracing::instrument(skip(self, reason))]
    pub async fn update_status(
        &self,
        order_id: AggregateId,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order, DomainError> {
        if target == OrderStatus::Cancelled {
            let reason = reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
            return self.cancel_order(order_id, reason).await;
        }

        let mut from = OrderStatus::default();
        let result = self
            .orders
            .execute(order_id, |order| {
                order.require_placed(order_id)?;
                from = order.status();
                order.transition_to(target, reason)
            })
            .await?;
        let order = result.aggregate;

        metrics::counter!("order_status_changes_total", "to" => target.as_str()).increment(1);
        tracing::info!(order_number = order.order_number(), %from, to = %target, "order status changed");

        dispatch(
            &self.notifier,
            Notification::OrderStatusChanged {
                order_id,
                order_number: order.order_number().to_string(),
                from,
                to: target,
            },
        )
        .await;
        Ok(order)
    }

    /// Cancels a pending or confirmed order and returns its stock.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_order(
        &self,
        order_id: AggregateId,
        reason: impl Into<String> + Send,
    ) -> Result<Order, DomainError> {
        let mut order = self.orders.load(order_id).await?;
        order.require_placed(order_id)?;

        let events = order.cancel(reason)?;
        let mut uow = UnitOfWork::new();
        uow.record(order_id, &mut order, events)?;
        self.stage_restock(order_id, order.lines(), &mut uow).await?;
        uow.commit(self.orders.store()).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        metrics::counter!("order_status_changes_total", "to" => OrderStatus::Cancelled.as_str())
            .increment(1);

        let reason = order.cancellation_reason().unwrap_or_default().to_string();
        tracing::info!(order_number = order.order_number(), %reason, "order cancelled");

        dispatch(
            &self.notifier,
            Notification::OrderCancelled {
                order_id,
                order_number: order.order_number().to_string(),
                reason,
            },
        )
        .await;
        Ok(order)
    }

    /// Records tracking, a note or payment details.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_admin(
        &self,
        order_id: AggregateId,
        update: AdminUpdate,
    ) -> Result<Order, DomainError> {
        update.validate()?;
        let result = self
            .orders
            .execute(order_id, |order| {
                order.require_placed(order_id)?;
                order.update_admin(update)
            })
            .await?;
        Ok(result.aggregate)
    }

    /// Loads an order, or None if no such order was placed.
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.orders.load_existing(order_id).await
    }

    /// Prices `cmd` against the catalog, stages the order and its stock
    /// decrements onto `uow`, and commits everything at once.
    async fn commit_order(&self, cmd: PlaceOrder, mut uow: UnitOfWork) -> Result<Order, DomainError> {
        let started = Instant::now();
        let order_id = AggregateId::new();

        let lines = self.stage_stock_decrement(order_id, &cmd.items, &mut uow).await?;
        let subtotal = lines
            .iter()
            .map(|line| line.unit_price.checked_multiply(line.quantity))
            .collect::<Option<Vec<_>>>()
            .and_then(Money::checked_sum)
            .ok_or_else(total_out_of_range)?;
        let charges = cmd
            .charges
            .unwrap_or_else(|| OrderCharges::from_policy(&self.shipping, subtotal));
        let pricing = Pricing::try_compute(subtotal, &charges).ok_or_else(total_out_of_range)?;

        let mut order = Order::default();
        let events = order.place(
            order_id,
            NewOrder {
                customer_id: cmd.customer_id,
                customer: cmd.customer,
                shipping_address: cmd.shipping_address,
                lines,
                charges,
                payment_method: cmd.payment_method,
                notes: cmd.notes,
            },
        )?;
        uow.record(order_id, &mut order, events)?;

        let streams = uow.len();
        uow.commit(self.orders.store()).await?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_number = order.order_number(),
            total = %pricing.total,
            streams,
            "order placed"
        );

        let email = order
            .customer()
            .map(|customer| customer.email.clone())
            .unwrap_or_default();
        dispatch(
            &self.notifier,
            Notification::OrderPlaced {
                order_id,
                order_number: order.order_number().to_string(),
                email,
                total: pricing.total,
            },
        )
        .await;
        Ok(order)
    }

    /// Snapshots each item from its product and stages one conditional
    /// decrement per product for the summed quantity.
    async fn stage_stock_decrement(
        &self,
        order_id: AggregateId,
        items: &[PlaceOrderItem],
        uow: &mut UnitOfWork,
    ) -> Result<Vec<OrderLine>, DomainError> {
        let mut products: BTreeMap<ProductId, Product> = BTreeMap::new();
        let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            if !products.contains_key(&item.sku) {
                let product = self.products.load(Product::id_for(&item.sku)).await?;
                product.require_listed(&item.sku)?;
                products.insert(item.sku.clone(), product);
            }
            let product = &products[&item.sku];
            if !product.in_stock() {
                return Err(CatalogError::OutOfStock {
                    sku: item.sku.clone(),
                    requested: item.quantity,
                    available: 0,
                }
                .into());
            }

            lines.push(OrderLine {
                sku: item.sku.clone(),
                name: product.name().to_string(),
                localized_name: product.localized_name().map(str::to_string),
                image: product.image().map(str::to_string),
                category: product.category().to_string(),
                specification: item.specification.trim().to_string(),
                quantity: item.quantity,
                unit_price: product.price(),
            });

            let total = wanted.entry(item.sku.clone()).or_insert(0);
            *total = total.saturating_add(item.quantity);
        }

        for (sku, quantity) in wanted {
            if let Some(product) = products.get_mut(&sku) {
                let events = product.reserve(order_id, quantity)?;
                uow.record(Product::id_for(&sku), product, events)?;
                metrics::counter!("stock_decrements_total", "source" => "order").increment(1);
            }
        }

        Ok(lines)
    }

    /// Stages stock replenishment for every line of a cancelled order.
    async fn stage_restock(
        &self,
        order_id: AggregateId,
        lines: &[OrderLine],
        uow: &mut UnitOfWork,
    ) -> Result<(), DomainError> {
        let mut returned: BTreeMap<&ProductId, u32> = BTreeMap::new();
        for line in lines {
            let total = returned.entry(&line.sku).or_insert(0);
            *total = total.saturating_add(line.quantity);
        }

        for (sku, quantity) in returned {
            let product_id = Product::id_for(sku);
            let mut product = self.products.load(product_id).await?;
            if product.id().is_none() {
                tracing::warn!(%sku, "cancelled order references unknown product, not restocked");
                continue;
            }
            let events = product.release(order_id, quantity)?;
            uow.record(product_id, &mut product, events)?;
        }
        Ok(())
    }
}

fn total_out_of_range() -> DomainError {
    ValidationErrors::single("items", "order total is too large to record").into()
}
