use chrono::{DateTime, Utc};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::value_objects::{LineItemId, Money, ProductId};

/// Product display data and price frozen when a line was added.
///
/// It is a cache of one catalog revision: it changes only when the line is
/// re-added, merged over, or explicitly refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub name: String,
    pub localized_name: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category: String,

    /// Product revision this snapshot was taken from.
    pub catalog_version: Version,

    pub taken_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn capture(entry: &CatalogEntry) -> Self {
        Self {
            name: entry.name.clone(),
            localized_name: entry.localized_name.clone(),
            price: entry.price,
            image: entry.image.clone(),
            category: entry.category.clone(),
            catalog_version: entry.version,
            taken_at: Utc::now(),
        }
    }

    /// True if the catalog has moved past the revision this was taken at.
    pub fn is_stale(&self, entry: &CatalogEntry) -> bool {
        self.catalog_version != entry.version
    }
}

/// One product + specification entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: LineItemId,
    pub sku: ProductId,

    /// Free-text variant (size, engraving); part of the line's identity.
    pub specification: String,

    pub quantity: u32,
    pub snapshot: PriceSnapshot,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn matches(&self, sku: &ProductId, specification: &str) -> bool {
        &self.sku == sku && self.specification == specification
    }

    pub fn line_total(&self) -> Money {
        self.snapshot.price.multiply(self.quantity)
    }
}
