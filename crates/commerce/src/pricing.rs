//! Shipping rule and derived order totals.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;
use crate::value_objects::Money;

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotals at or above this ship free.
    pub free_threshold: Money,

    /// Fee charged below the threshold.
    pub flat_fee: Money,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Money::from_units(1000),
            flat_fee: Money::from_units(50),
        }
    }
}

impl ShippingPolicy {
    /// Fee for a given subtotal. Nothing to ship costs nothing.
    pub fn fee_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal >= self.free_threshold {
            Money::zero()
        } else {
            self.flat_fee
        }
    }
}

/// Charges applied on top of an order's subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCharges {
    #[serde(default)]
    pub shipping_fee: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub discount: Money,
}

impl OrderCharges {
    pub fn new(shipping_fee: Money, tax: Money, discount: Money) -> Self {
        Self {
            shipping_fee,
            tax,
            discount,
        }
    }

    /// Shipping from the policy, no tax, no discount.
    pub fn from_policy(policy: &ShippingPolicy, subtotal: Money) -> Self {
        Self {
            shipping_fee: policy.fee_for(subtotal),
            ..Self::default()
        }
    }

    pub(crate) fn check(&self, errors: &mut ValidationErrors, prefix: &str) {
        for (field, amount) in [
            ("shipping_fee", self.shipping_fee),
            ("tax", self.tax),
            ("discount", self.discount),
        ] {
            if amount.is_negative() {
                errors.push(format!("{prefix}.{field}"), "must not be negative");
            } else if !amount.is_within_limit() {
                errors.push(
                    format!("{prefix}.{field}"),
                    format!("must not exceed {}", Money::MAX_AMOUNT),
                );
            }
        }
    }
}

/// Totals derived from line items and charges. Never accepted as input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl Pricing {
    /// `total = max(0, subtotal + shipping + tax - discount)`.
    ///
    /// Saturates instead of overflowing; orders are priced with
    /// [`Pricing::try_compute`] before they are recorded, so stored orders
    /// never reach the bound.
    pub fn compute(subtotal: Money, charges: &OrderCharges) -> Self {
        let total =
            (subtotal + charges.shipping_fee + charges.tax - charges.discount).floor_at_zero();
        Self::with_total(subtotal, charges, total)
    }

    /// Like [`Pricing::compute`], but None if any step overflows.
    pub fn try_compute(subtotal: Money, charges: &OrderCharges) -> Option<Self> {
        let total = subtotal
            .checked_add(charges.shipping_fee)?
            .checked_add(charges.tax)?
            .checked_sub(charges.discount)?
            .floor_at_zero();
        Some(Self::with_total(subtotal, charges, total))
    }

    fn with_total(subtotal: Money, charges: &OrderCharges, total: Money) -> Self {
        Self {
            subtotal,
            shipping_fee: charges.shipping_fee,
            tax: charges.tax,
            discount: charges.discount,
            total,
        }
    }
}
