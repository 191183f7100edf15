//! Read model views for the storefront query side.

pub mod cart_activity;
pub mod customer_orders;
pub mod order_board;
pub mod stock_levels;

pub use cart_activity::{CartActivity, CartActivityView};
pub use customer_orders::{CustomerOrders, CustomerOrdersView};
pub use order_board::{OrderBoardView, OrderPage, OrderSummary};
pub use stock_levels::{StockLevel, StockLevelsView};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use commerce::order::OrderPlacedData;
    use commerce::{
        CartEvent, CustomerId, CustomerInfo, DomainEvent, Money, OrderCharges, OrderEvent,
        OrderLine, PaymentMethod, ProductEvent, ShippingAddress,
    };
    use common::AggregateId;
    use event_store::{EventEnvelope, Version};
    use serde::Serialize;

    fn envelope<E: DomainEvent + Serialize>(
        aggregate_type: &str,
        aggregate_id: AggregateId,
        version: i64,
        event: &E,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type(aggregate_type)
            .event_type(event.event_type())
            .version(Version::new(version))
            .payload(event)
            .unwrap()
            .build()
            .unwrap()
    }

    pub fn order_envelope(order_id: AggregateId, version: i64, event: &OrderEvent) -> EventEnvelope {
        envelope("Order", order_id, version, event)
    }

    pub fn cart_envelope(cart_id: AggregateId, version: i64, event: &CartEvent) -> EventEnvelope {
        envelope("Cart", cart_id, version, event)
    }

    pub fn product_envelope(
        product_id: AggregateId,
        version: i64,
        event: &ProductEvent,
    ) -> EventEnvelope {
        envelope("Product", product_id, version, event)
    }

    fn line(sku: &str, quantity: u32, unit_price: i64) -> OrderLine {
        OrderLine {
            sku: sku.into(),
            name: sku.to_string(),
            localized_name: None,
            image: None,
            category: "Puja".into(),
            specification: String::new(),
            quantity,
            unit_price: Money::from_units(unit_price),
        }
    }

    /// 2 x 300 + 1 x 700 with a 50 shipping fee: total 1350.
    pub fn placed_by(
        order_id: AggregateId,
        customer_id: Option<CustomerId>,
        placed_at: DateTime<Utc>,
    ) -> OrderEvent {
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            order_number: commerce::order::order_number(order_id, placed_at),
            customer_id,
            customer: CustomerInfo {
                name: "Asha Rao".into(),
                email: "asha@example.in".into(),
                phone: "9800000000".into(),
            },
            shipping_address: ShippingAddress {
                line1: "12 Temple Street".into(),
                line2: None,
                city: "Udupi".into(),
                state: "Karnataka".into(),
                postal_code: "576101".into(),
                country: "IN".into(),
            },
            lines: vec![line("LAMP-01", 2, 300), line("BELL-02", 1, 700)],
            charges: OrderCharges::new(Money::from_units(50), Money::zero(), Money::zero()),
            payment_method: PaymentMethod::CashOnDelivery,
            notes: None,
            placed_at,
        })
    }

    pub fn placed(order_id: AggregateId, placed_at: DateTime<Utc>) -> OrderEvent {
        placed_by(order_id, Some(CustomerId::new()), placed_at)
    }
}
