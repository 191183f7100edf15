use serde::Deserialize;

use crate::value_objects::ProductId;

/// Request to put a product in the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub sku: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub specification: String,
}

impl AddToCart {
    pub fn new(sku: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
            specification: String::new(),
        }
    }

    pub fn with_specification(mut self, specification: impl Into<String>) -> Self {
        self.specification = specification.into();
        self
    }

    /// Specification with surrounding whitespace removed, so "Large " and
    /// "Large" land on the same line.
    pub(crate) fn normalized_specification(&self) -> String {
        self.specification.trim().to_string()
    }
}
