//! Catalog commands.

use serde::Deserialize;

use crate::validation::ValidationErrors;
use crate::value_objects::{Money, ProductId};

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ListProduct {
    pub sku: ProductId,
    pub name: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
}

impl ListProduct {
    pub fn new(
        sku: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            localized_name: None,
            category: category.into(),
            image: None,
            price,
            stock,
        }
    }

    pub fn with_localized_name(mut self, name: impl Into<String>) -> Self {
        self.localized_name = Some(name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("sku", self.sku.as_str());
        errors.require("name", &self.name);
        errors.require("category", &self.category);
        if !self.price.is_positive() {
            errors.push("price", "must be greater than 0");
        } else if !self.price.is_within_limit() {
            errors.push("price", format!("must not exceed {}", Money::MAX_AMOUNT));
        }
        errors.into_result()
    }
}
