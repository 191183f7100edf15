//! Order aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::pricing::{OrderCharges, Pricing};
use crate::value_objects::{CustomerId, Money};

use super::details::order_number;
use super::{
    AdminNote, AdminUpdate, CustomerInfo, OrderError, OrderEvent, OrderLine, OrderPlacedData,
    OrderStatus, PaymentDetails, PaymentMethod, PaymentStatus, ShippingAddress, TrackingInfo,
};

/// Reason recorded when an administrator cancels through a status change.
pub const DEFAULT_CANCEL_REASON: &str = "Cancelled by administrator";

/// A placed order.
///
/// Lines, customer and address never change after placement. Status only
/// moves along the transitions allowed by [`OrderStatus::can_transition_to`]
/// and lifecycle timestamps are stamped by those transitions alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    order_number: String,
    customer_id: Option<CustomerId>,
    customer: Option<CustomerInfo>,
    shipping_address: Option<ShippingAddress>,
    lines: Vec<OrderLine>,
    charges: OrderCharges,
    status: OrderStatus,
    payment: PaymentDetails,
    tracking: Option<TrackingInfo>,
    notes: Option<String>,
    admin_notes: Vec<AdminNote>,
    cancellation_reason: Option<String>,
    placed_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
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
            OrderEvent::OrderPlaced(data) => {
                self.id = Some(data.order_id);
                self.order_number = data.order_number;
                self.customer_id = data.customer_id;
                self.customer = Some(data.customer);
                self.shipping_address = Some(data.shipping_address);
                self.lines = data.lines;
                self.charges = data.charges;
                self.payment = PaymentDetails {
                    method: data.payment_method,
                    ..PaymentDetails::default()
                };
                self.notes = data.notes;
                self.status = OrderStatus::Pending;
                self.placed_at = Some(data.placed_at);
                self.updated_at = Some(data.placed_at);
            }
            OrderEvent::OrderStatusChanged(data) => {
                self.status = data.to;
                let at = Some(data.changed_at);
                match data.to {
                    OrderStatus::Confirmed => self.confirmed_at = at,
                    OrderStatus::Shipped => self.shipped_at = at,
                    OrderStatus::Delivered => self.delivered_at = at,
                    OrderStatus::Refunded => self.refunded_at = at,
                    _ => {}
                }
                self.updated_at = at;
            }
            OrderEvent::OrderCancelled(data) => {
                self.status = OrderStatus::Cancelled;
                self.cancellation_reason = Some(data.reason);
                self.cancelled_at = Some(data.cancelled_at);
                self.updated_at = Some(data.cancelled_at);
            }
            OrderEvent::PaymentUpdated(data) => {
                self.payment.status = data.status;
                if let Some(method) = data.method {
                    self.payment.method = method;
                }
                if data.transaction_ref.is_some() {
                    self.payment.transaction_ref = data.transaction_ref;
                }
                if data.status == PaymentStatus::Paid {
                    self.payment.paid_at = Some(data.updated_at);
                }
                self.updated_at = Some(data.updated_at);
            }
            OrderEvent::TrackingUpdated(data) => {
                self.tracking = Some(data.tracking);
                self.updated_at = Some(data.updated_at);
            }
            OrderEvent::AdminNoteAdded(data) => {
                self.updated_at = Some(data.note.added_at);
                self.admin_notes.push(data.note);
            }
        }
    }
}

impl Order {
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn charges(&self) -> &OrderCharges {
        &self.charges
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Full price breakdown, recomputed from the lines on every call.
    pub fn pricing(&self) -> Pricing {
        Pricing::compute(self.subtotal(), &self.charges)
    }

    pub fn total(&self) -> Money {
        self.pricing().total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment(&self) -> &PaymentDetails {
        &self.payment
    }

    pub fn tracking(&self) -> Option<&TrackingInfo> {
        self.tracking.as_ref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn admin_notes(&self) -> &[AdminNote] {
        &self.admin_notes
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn refunded_at(&self) -> Option<DateTime<Utc>> {
        self.refunded_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Everything needed to record a new order; lines are already priced from
/// the catalog.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<OrderLine>,
    pub charges: OrderCharges,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

// Command methods (return events)
impl Order {
    /// Fails with `NotFound` unless this order has been placed.
    pub fn require_placed(&self, order_id: AggregateId) -> Result<(), OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotFound { order_id });
        }
        Ok(())
    }

    pub fn place(
        &self,
        order_id: AggregateId,
        order: NewOrder,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced { order_id });
        }
        if order.lines.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(line) = order.lines.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                sku: line.sku.clone(),
            });
        }

        let placed_at = Utc::now();
        Ok(vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            order_number: order_number(order_id, placed_at),
            customer_id: order.customer_id,
            customer: order.customer,
            shipping_address: order.shipping_address,
            lines: order.lines,
            charges: order.charges,
            payment_method: order.payment_method,
            notes: order.notes.filter(|notes| !notes.trim().is_empty()),
            placed_at,
        })])
    }

    /// Moves the order to `target`, with the side effects that status
    /// carries: delivery settles payment, refund marks it refunded, and
    /// cancellation records `reason`.
    pub fn transition_to(
        &self,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }

        let events = match target {
            OrderStatus::Cancelled => vec![OrderEvent::order_cancelled(
                self.status,
                reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string()),
            )],
            OrderStatus::Delivered => vec![
                OrderEvent::status_changed(self.status, target),
                OrderEvent::payment_updated(PaymentStatus::Paid, None, None),
            ],
            OrderStatus::Refunded => vec![
                OrderEvent::status_changed(self.status, target),
                OrderEvent::payment_updated(PaymentStatus::Refunded, None, None),
            ],
            _ => vec![OrderEvent::status_changed(self.status, target)],
        };
        Ok(events)
    }

    /// Cancels a pending or confirmed order.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
            });
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(OrderError::MissingCancelReason);
        }
        self.transition_to(OrderStatus::Cancelled, Some(reason))
    }

    /// Records tracking, notes and payment details without touching status.
    pub fn update_admin(&self, update: AdminUpdate) -> Result<Vec<OrderEvent>, OrderError> {
        let mut events = Vec::new();

        if let Some(tracking) = update.tracking {
            events.push(OrderEvent::tracking_updated(tracking));
        }
        if let Some(note) = update.note {
            events.push(OrderEvent::admin_note_added(note.trim()));
        }
        if let Some(payment) = update.payment {
            events.push(OrderEvent::payment_updated(
                payment.status,
                payment.method,
                payment.transaction_ref,
            ));
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PaymentUpdate;
    use crate::value_objects::ProductId;

    fn line(sku: &str, units: i64, quantity: u32) -> OrderLine {
        OrderLine {
            sku: ProductId::new(sku),
            name: sku.to_string(),
            localized_name: None,
            image: None,
            category: "Puja".into(),
            specification: String::new(),
            quantity,
            unit_price: Money::from_units(units),
        }
    }

    fn new_order(lines: Vec<OrderLine>, charges: OrderCharges) -> NewOrder {
        NewOrder {
            customer_id: None,
            customer: CustomerInfo {
                name: "Asha Rao".into(),
                email: "asha@example.in".into(),
                phone: "9845000000".into(),
            },
            shipping_address: ShippingAddress {
                line1: "12 Temple Street".into(),
                line2: None,
                city: "Udupi".into(),
                state: "Karnataka".into(),
                postal_code: "576101".into(),
                country: "IN".into(),
            },
            lines,
            charges,
            payment_method: PaymentMethod::CashOnDelivery,
            notes: None,
        }
    }

    fn placed() -> Order {
        let mut order = Order::default();
        let charges = OrderCharges::new(Money::from_units(50), Money::zero(), Money::zero());
        let events = order
            .place(
                AggregateId::new(),
                new_order(vec![line("LAMP-01", 300, 1), line("BELL-02", 700, 1)], charges),
            )
            .unwrap();
        order.apply_events(events);
        order
    }

    fn moved(mut order: Order, target: OrderStatus) -> Order {
        let events = order.transition_to(target, None).unwrap();
        order.apply_events(events);
        order
    }

    #[test]
    fn placing_prices_the_order() {
        let order = placed();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.order_number().starts_with("ORD-"));

        let pricing = order.pricing();
        assert_eq!(pricing.subtotal, Money::from_units(1000));
        assert_eq!(pricing.shipping_fee, Money::from_units(50));
        assert_eq!(pricing.total, Money::from_units(1050));
        assert_eq!(order.payment().status, PaymentStatus::Pending);
    }

    #[test]
    fn cannot_place_twice_or_empty() {
        let order = placed();
        let again = order.place(
            order.id().unwrap(),
            new_order(vec![line("A", 1, 1)], OrderCharges::default()),
        );
        assert!(matches!(again, Err(OrderError::AlreadyPlaced { .. })));

        let empty = Order::default().place(
            AggregateId::new(),
            new_order(vec![], OrderCharges::default()),
        );
        assert!(matches!(empty, Err(OrderError::NoItems)));
    }

    #[test]
    fn transitions_stamp_lifecycle_dates() {
        let order = moved(placed(), OrderStatus::Confirmed);
        assert!(order.confirmed_at().is_some());

        let order = moved(order, OrderStatus::Shipped);
        assert!(order.shipped_at().is_some());
        assert!(order.delivered_at().is_none());
    }

    #[test]
    fn delivery_marks_payment_paid() {
        let order = moved(placed(), OrderStatus::Delivered);
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.delivered_at().is_some());
        assert_eq!(order.payment().status, PaymentStatus::Paid);
        assert!(order.payment().paid_at.is_some());
    }

    #[test]
    fn shipped_order_cannot_be_cancelled() {
        let order = moved(placed(), OrderStatus::Shipped);
        let result = order.cancel("changed my mind");
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            })
        ));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn cancel_records_the_reason() {
        let mut order = moved(placed(), OrderStatus::Confirmed);
        let events = order.cancel("duplicate order").unwrap();
        order.apply_events(events);

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some("duplicate order"));
        assert!(order.cancelled_at().is_some());
    }

    #[test]
    fn blank_reason_is_rejected_on_a_cancellable_order() {
        let order = placed();
        assert!(matches!(
            order.cancel(" "),
            Err(OrderError::MissingCancelReason)
        ));
    }

    #[test]
    fn status_is_checked_before_the_reason() {
        let order = moved(placed(), OrderStatus::Shipped);
        assert!(matches!(
            order.cancel(""),
            Err(OrderError::InvalidStateTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            })
        ));
    }

    #[test]
    fn status_change_to_cancelled_uses_default_reason() {
        let order = moved(placed(), OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some(DEFAULT_CANCEL_REASON));
    }

    #[test]
    fn refund_is_terminal_for_refunds_only() {
        let order = moved(moved(placed(), OrderStatus::Delivered), OrderStatus::Refunded);
        assert_eq!(order.payment().status, PaymentStatus::Refunded);
        assert!(order.refunded_at().is_some());
        assert!(order.transition_to(OrderStatus::Refunded, None).is_err());
    }

    #[test]
    fn same_status_is_rejected() {
        let order = moved(placed(), OrderStatus::Confirmed);
        assert!(matches!(
            order.transition_to(OrderStatus::Confirmed, None),
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn admin_update_leaves_status_alone() {
        let mut order = placed();
        let events = order
            .update_admin(AdminUpdate {
                tracking: Some(TrackingInfo {
                    carrier: "India Post".into(),
                    tracking_number: "EE123456789IN".into(),
                    url: None,
                }),
                note: Some("  gift wrap  ".into()),
                payment: Some(PaymentUpdate {
                    status: PaymentStatus::Paid,
                    method: Some(PaymentMethod::Online),
                    transaction_ref: Some("UPI-42".into()),
                }),
            })
            .unwrap();
        assert_eq!(events.len(), 3);
        order.apply_events(events);

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.tracking().unwrap().carrier, "India Post");
        assert_eq!(order.admin_notes()[0].note, "gift wrap");
        assert_eq!(order.payment().method, PaymentMethod::Online);
        assert_eq!(order.payment().transaction_ref.as_deref(), Some("UPI-42"));
    }

    #[test]
    fn pricing_survives_a_snapshot_round_trip() {
        let order = placed();
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("total").is_none());

        let restored: Order = serde_json::from_value(json).unwrap();
        assert_eq!(restored.total(), Money::from_units(1050));
    }
}
