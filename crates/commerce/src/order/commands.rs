//! Order input DTOs.
//!
//! None of these carry a total: pricing is always computed server side.

use serde::Deserialize;

use crate::pricing::OrderCharges;
use crate::validation::ValidationErrors;
use crate::value_objects::{CustomerId, ProductId};

use super::{CustomerInfo, PaymentMethod, PaymentStatus, ShippingAddress, TrackingInfo};

/// Request to place an order directly from a list of items.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    /// Absent for guest checkout.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,

    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub items: Vec<PlaceOrderItem>,

    /// When omitted, shipping follows the store policy and tax and
    /// discount are zero.
    #[serde(default)]
    pub charges: Option<OrderCharges>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderItem {
    pub sku: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub specification: String,
}

impl PlaceOrderItem {
    pub fn new(sku: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
            specification: String::new(),
        }
    }
}

impl PlaceOrder {
    pub fn new(
        customer: CustomerInfo,
        shipping_address: ShippingAddress,
        items: Vec<PlaceOrderItem>,
    ) -> Self {
        Self {
            customer_id: None,
            customer,
            shipping_address,
            items,
            charges: None,
            payment_method: PaymentMethod::default(),
            notes: None,
        }
    }

    pub fn for_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_charges(mut self, charges: OrderCharges) -> Self {
        self.charges = Some(charges);
        self
    }

    /// Checks every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.customer.check(&mut errors);
        self.shipping_address.check(&mut errors);

        if self.items.is_empty() {
            errors.push("items", "must contain at least one item");
        }
        for (i, item) in self.items.iter().enumerate() {
            errors.require(&format!("items[{i}].sku"), item.sku.as_str());
            if item.quantity == 0 {
                errors.push(format!("items[{i}].quantity"), "must be at least 1");
            }
        }

        if let Some(charges) = &self.charges {
            charges.check(&mut errors, "charges");
        }

        errors.into_result()
    }
}

/// Checkout details supplied alongside an existing cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutCart {
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub charges: Option<OrderCharges>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutCart {
    pub fn new(customer: CustomerInfo, shipping_address: ShippingAddress) -> Self {
        Self {
            customer,
            shipping_address,
            charges: None,
            payment_method: PaymentMethod::default(),
            notes: None,
        }
    }
}

/// Payment settlement recorded by an administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

/// Administrative changes that do not move the order's status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdate {
    #[serde(default)]
    pub tracking: Option<TrackingInfo>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentUpdate>,
}

impl AdminUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.tracking.is_none() && self.note.is_none() && self.payment.is_none() {
            errors.push("update", "must change tracking, note or payment");
        }
        if let Some(tracking) = &self.tracking {
            tracking.check(&mut errors);
        }
        if let Some(note) = &self.note {
            errors.require("note", note);
        }
        if let Some(payment) = &self.payment
            && !matches!(payment.status, PaymentStatus::Paid | PaymentStatus::Failed)
        {
            errors.push("payment.status", "must be paid or failed");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Asha Rao".into(),
            email: "asha@example.in".into(),
            phone: "+91 98450 00000".into(),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            line1: "12 Temple Street".into(),
            line2: None,
            city: "Udupi".into(),
            state: "Karnataka".into(),
            postal_code: "576101".into(),
            country: "IN".into(),
        }
    }

    #[test]
    fn valid_order_passes() {
        let cmd = PlaceOrder::new(customer(), address(), vec![PlaceOrderItem::new("MALA-108", 1)]);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let mut customer = customer();
        customer.email = "not-an-email".into();
        let mut address = address();
        address.city = " ".into();

        let cmd = PlaceOrder::new(
            customer,
            address,
            vec![PlaceOrderItem::new("", 1), PlaceOrderItem::new("LAMP-01", 0)],
        )
        .with_charges(OrderCharges::new(Money::zero(), Money::from_cents(-1), Money::zero()));

        let errors = cmd.validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "customer.email",
                "shipping_address.city",
                "items[0].sku",
                "items[1].quantity",
                "charges.tax",
            ]
        );
    }

    #[test]
    fn empty_order_is_invalid() {
        let errors = PlaceOrder::new(customer(), address(), vec![])
            .validate()
            .unwrap_err();
        assert_eq!(errors.errors()[0].field, "items");
    }

    #[test]
    fn admin_update_needs_content() {
        assert!(AdminUpdate::default().validate().is_err());

        let update = AdminUpdate {
            payment: Some(PaymentUpdate {
                status: PaymentStatus::Refunded,
                method: None,
                transaction_ref: None,
            }),
            ..AdminUpdate::default()
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field, "payment.status");

        let update = AdminUpdate {
            note: Some("Called customer, confirmed address".into()),
            ..AdminUpdate::default()
        };
        assert!(update.validate().is_ok());
    }
}
