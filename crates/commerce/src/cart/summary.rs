use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::catalog::CatalogEntry;
use crate::pricing::ShippingPolicy;
use crate::value_objects::{CustomerId, LineItemId, Money, ProductId};

use super::Cart;

/// Read view of a cart with derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub cart_id: AggregateId,
    pub customer_id: CustomerId,
    pub lines: Vec<CartLineSummary>,
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: Version,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineSummary {
    pub line_id: LineItemId,
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub specification: String,
    pub quantity: u32,

    /// Price frozen in the line's snapshot.
    pub unit_price: Money,
    pub line_total: Money,

    /// Live catalog price, when the product could be looked up.
    pub current_price: Option<Money>,

    /// True when the live price differs from the snapshot.
    pub price_changed: bool,

    pub added_at: DateTime<Utc>,
}

impl CartSummary {
    /// Summarizes `cart` for `customer_id`, comparing each line against the
    /// `live` catalog entries.
    pub fn build(
        customer_id: CustomerId,
        cart: &Cart,
        live: &[CatalogEntry],
        shipping: &ShippingPolicy,
    ) -> Self {
        let lines = cart
            .lines()
            .iter()
            .map(|line| {
                let current_price = live
                    .iter()
                    .find(|entry| entry.sku == line.sku)
                    .map(|entry| entry.price);
                CartLineSummary {
                    line_id: line.line_id,
                    sku: line.sku.clone(),
                    name: line.snapshot.name.clone(),
                    localized_name: line.snapshot.localized_name.clone(),
                    image: line.snapshot.image.clone(),
                    category: line.snapshot.category.clone(),
                    specification: line.specification.clone(),
                    quantity: line.quantity,
                    unit_price: line.snapshot.price,
                    line_total: line.line_total(),
                    current_price,
                    price_changed: current_price.is_some_and(|price| price != line.snapshot.price),
                    added_at: line.added_at,
                }
            })
            .collect();

        let subtotal = cart.subtotal();
        let shipping_fee = shipping.fee_for(subtotal);

        Self {
            cart_id: Cart::id_for(&customer_id),
            customer_id,
            lines,
            item_count: cart.item_count(),
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            updated_at: cart.updated_at(),
            version: cart.version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sku: &str, units: i64, version: i64) -> CatalogEntry {
        CatalogEntry {
            sku: ProductId::new(sku),
            name: sku.to_string(),
            localized_name: None,
            category: "Puja".to_string(),
            image: None,
            price: Money::from_units(units),
            stock: 5,
            available: true,
            version: Version::new(version),
        }
    }

    fn cart_with(customer: CustomerId, items: &[(CatalogEntry, u32)]) -> Cart {
        let mut cart = Cart::default();
        for (entry, quantity) in items {
            let events = cart
                .add_item(customer, entry, String::new(), *quantity)
                .unwrap();
            cart.apply_events(events);
        }
        cart
    }

    #[test]
    fn empty_cart_costs_nothing() {
        let customer = CustomerId::new();
        let summary =
            CartSummary::build(customer, &Cart::default(), &[], &ShippingPolicy::default());
        assert!(summary.lines.is_empty());
        assert_eq!(summary.shipping_fee, Money::zero());
        assert_eq!(summary.total, Money::zero());
    }

    #[test]
    fn below_threshold_pays_flat_shipping() {
        let customer = CustomerId::new();
        let cart = cart_with(customer, &[(entry("LAMP", 300, 1), 1)]);
        let summary = CartSummary::build(customer, &cart, &[], &ShippingPolicy::default());

        assert_eq!(summary.subtotal, Money::from_units(300));
        assert_eq!(summary.shipping_fee, Money::from_units(50));
        assert_eq!(summary.total, Money::from_units(350));
    }

    #[test]
    fn reports_lines_whose_price_moved() {
        let customer = CustomerId::new();
        let cart = cart_with(
            customer,
            &[(entry("LAMP", 300, 1), 1), (entry("BELL", 700, 1), 1)],
        );
        let live = [entry("LAMP", 300, 2), entry("BELL", 750, 2)];
        let summary = CartSummary::build(customer, &cart, &live, &ShippingPolicy::default());

        assert!(!summary.lines[0].price_changed);
        assert!(summary.lines[1].price_changed);
        assert_eq!(summary.lines[1].unit_price, Money::from_units(700));
        assert_eq!(summary.lines[1].current_price, Some(Money::from_units(750)));
        assert_eq!(summary.subtotal, Money::from_units(1000));
        assert_eq!(summary.shipping_fee, Money::zero());
        assert_eq!(summary.item_count, 2);
    }
}
