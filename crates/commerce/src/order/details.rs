//! Value objects recorded on an order.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;
use crate::value_objects::{Money, ProductId};

use super::{PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    pub(crate) fn check(&self, errors: &mut ValidationErrors) {
        errors.require("customer.name", &self.name);
        errors.require("customer.phone", &self.phone);
        if self.email.trim().is_empty() {
            errors.push("customer.email", "is required");
        } else if !looks_like_email(&self.email) {
            errors.push("customer.email", "is not a valid email address");
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub(crate) fn check(&self, errors: &mut ValidationErrors) {
        errors.require("shipping_address.line1", &self.line1);
        errors.require("shipping_address.city", &self.city);
        errors.require("shipping_address.state", &self.state);
        errors.require("shipping_address.postal_code", &self.postal_code);
        errors.require("shipping_address.country", &self.country);
    }
}

/// A purchased product, frozen at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub image: Option<String>,
    pub category: String,
    #[serde(default)]
    pub specification: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    /// Always derived; there is no stored line total to drift.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl TrackingInfo {
    pub(crate) fn check(&self, errors: &mut ValidationErrors) {
        errors.require("tracking.carrier", &self.carrier);
        errors.require("tracking.tracking_number", &self.tracking_number);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminNote {
    pub note: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Human-facing order reference: `ORD-YYYYMMDD-XXXXXXXX`.
pub fn order_number(order_id: AggregateId, placed_at: DateTime<Utc>) -> String {
    let hex = order_id.as_uuid().simple().to_string();
    format!(
        "ORD-{}-{}",
        placed_at.format("%Y%m%d"),
        hex[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_number_has_date_and_id_prefix() {
        let id: AggregateId = "1b4e28ba-2fa1-11d2-883f-0016d3cca427".parse().unwrap();
        let placed_at = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        assert_eq!(order_number(id, placed_at), "ORD-20260309-1B4E28BA");
    }

    #[test]
    fn email_needs_local_part_and_dotted_domain() {
        assert!(looks_like_email("devi@example.in"));
        assert!(!looks_like_email("devi@localhost"));
        assert!(!looks_like_email("@example.in"));
        assert!(!looks_like_email("devi.example.in"));
    }

    #[test]
    fn line_total_multiplies_unit_price() {
        let line = OrderLine {
            sku: ProductId::new("LAMP-01"),
            name: "Brass Diya".into(),
            localized_name: None,
            image: None,
            category: "Puja".into(),
            specification: String::new(),
            quantity: 3,
            unit_price: Money::from_cents(29_950),
        };
        assert_eq!(line.line_total(), Money::from_cents(89_850));
    }
}
