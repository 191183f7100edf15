//! Cart aggregate: one per customer, lines keyed by (sku, specification).

use chrono::{DateTime, TimeDelta, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::catalog::CatalogEntry;
use crate::value_objects::{CustomerId, LineItemId, Money};

use super::{CartError, CartEvent, CartLine, PriceSnapshot};

/// A customer's cart.
///
/// Lines are unique per (sku, specification) and every quantity is at
/// least 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    customer_id: Option<CustomerId>,
    lines: Vec<CartLine>,
    opened_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
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
        self.updated_at = Some(event.occurred_at());

        match event {
            CartEvent::CartOpened(data) => {
                self.id = Some(data.cart_id);
                self.customer_id = Some(data.customer_id);
                self.opened_at = Some(data.opened_at);
            }
            CartEvent::LineItemAdded(data) => {
                self.lines.push(CartLine {
                    line_id: data.line_id,
                    sku: data.sku,
                    specification: data.specification,
                    quantity: data.quantity,
                    snapshot: data.snapshot,
                    added_at: data.added_at,
                });
            }
            CartEvent::LineItemQuantityChanged(data) => {
                if let Some(line) = self.line_mut(data.line_id) {
                    line.quantity = data.new_quantity;
                }
            }
            CartEvent::LineItemRemoved(data) => {
                self.lines.retain(|line| line.line_id != data.line_id);
            }
            CartEvent::LineSnapshotRefreshed(data) => {
                if let Some(line) = self.line_mut(data.line_id) {
                    line.snapshot = data.snapshot;
                }
            }
            CartEvent::CartCleared(_) | CartEvent::CartExpired(_) => {
                self.lines.clear();
            }
        }
    }
}

impl SnapshotCapable for Cart {
    fn snapshot_interval() -> usize {
        50
    }
}

impl Cart {
    /// Carts untouched for this long are emptied by the purge.
    pub const IDLE_LIMIT_DAYS: i64 = 30;

    /// Stream id of the customer's cart.
    pub fn id_for(customer_id: &CustomerId) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), &customer_id.to_string())
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: LineItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    fn line_mut(&mut self, line_id: LineItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.line_id == line_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line totals at snapshot prices.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    /// Time of the last recorded change.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// True once the cart has been idle for longer than `max_idle` at `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: TimeDelta) -> bool {
        match self.updated_at {
            Some(updated_at) => now - updated_at > max_idle,
            None => false,
        }
    }
}

// Command methods (return events)
impl Cart {
    /// Opens the cart if this customer has never had one.
    pub fn open(&self, customer_id: CustomerId) -> Vec<CartEvent> {
        if self.id.is_some() {
            return vec![];
        }
        vec![CartEvent::cart_opened(Self::id_for(&customer_id), customer_id)]
    }

    /// Adds `quantity` of a product, accumulating onto an existing line with
    /// the same specification.
    ///
    /// A fresh line captures the catalog entry as its snapshot. Accumulating
    /// leaves the existing snapshot alone.
    pub fn add_item(
        &self,
        customer_id: CustomerId,
        entry: &CatalogEntry,
        specification: String,
        quantity: u32,
    ) -> Result<Vec<CartEvent>, CartError> {
        let mut draft = self.clone();
        let mut events = draft.stage(self.open(customer_id));
        let added = draft.add_line(entry, specification, quantity, false)?;
        events.extend(draft.stage(added));
        Ok(events)
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(
        &self,
        line_id: LineItemId,
        quantity: i64,
    ) -> Result<Vec<CartEvent>, CartError> {
        let line = self
            .line(line_id)
            .ok_or(CartError::LineItemNotFound { line_id })?;

        if quantity <= 0 {
            return Ok(vec![CartEvent::line_item_removed(line_id)]);
        }
        let new_quantity =
            u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity { quantity })?;
        if new_quantity == line.quantity {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::quantity_changed(
            line_id,
            line.quantity,
            new_quantity,
        )])
    }

    pub fn remove_item(&self, line_id: LineItemId) -> Result<Vec<CartEvent>, CartError> {
        if self.line(line_id).is_none() {
            return Err(CartError::LineItemNotFound { line_id });
        }
        Ok(vec![CartEvent::line_item_removed(line_id)])
    }

    /// Empties the cart. An existing cart always records the clear.
    pub fn clear(&self) -> Vec<CartEvent> {
        if self.id.is_none() {
            return vec![];
        }
        vec![CartEvent::cart_cleared()]
    }

    /// Folds items from another cart (typically a guest session) into this
    /// one.
    ///
    /// Lines that already exist accumulate quantity and take a fresh snapshot
    /// from `entry`. Any unavailable product rejects the whole merge.
    pub fn merge(
        &self,
        customer_id: CustomerId,
        items: &[(CatalogEntry, String, u32)],
    ) -> Result<Vec<CartEvent>, CartError> {
        let mut draft = self.clone();
        let mut events = draft.stage(self.open(customer_id));

        for (entry, specification, quantity) in items {
            let staged = draft.add_line(entry, specification.clone(), *quantity, true)?;
            events.extend(draft.stage(staged));
        }
        Ok(events)
    }

    /// Re-snapshots every line whose product has changed since its snapshot
    /// was taken. Lines with no entry in `entries` are left as they are.
    pub fn refresh_prices(&self, entries: &[CatalogEntry]) -> Vec<CartEvent> {
        self.lines
            .iter()
            .filter_map(|line| {
                let entry = entries.iter().find(|entry| entry.sku == line.sku)?;
                line.snapshot
                    .is_stale(entry)
                    .then(|| CartEvent::snapshot_refreshed(line.line_id, PriceSnapshot::capture(entry)))
            })
            .collect()
    }

    /// Empties a cart that has held items without activity for longer than
    /// `max_idle`.
    pub fn expire(&self, now: DateTime<Utc>, max_idle: TimeDelta) -> Vec<CartEvent> {
        match self.updated_at {
            Some(idle_since) if !self.lines.is_empty() && self.is_idle(now, max_idle) => {
                vec![CartEvent::cart_expired(idle_since, now)]
            }
            _ => vec![],
        }
    }

    fn add_line(
        &self,
        entry: &CatalogEntry,
        specification: String,
        quantity: u32,
        refresh_existing: bool,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: i64::from(quantity),
            });
        }
        if !entry.available {
            return Err(CartError::OutOfStock {
                sku: entry.sku.clone(),
            });
        }

        let existing = self
            .lines
            .iter()
            .find(|line| line.matches(&entry.sku, &specification));

        let Some(line) = existing else {
            return Ok(vec![CartEvent::line_item_added(
                entry.sku.clone(),
                specification,
                quantity,
                PriceSnapshot::capture(entry),
            )]);
        };

        let mut events = vec![CartEvent::quantity_changed(
            line.line_id,
            line.quantity,
            line.quantity.saturating_add(quantity),
        )];
        if refresh_existing && line.snapshot.is_stale(entry) {
            events.push(CartEvent::snapshot_refreshed(
                line.line_id,
                PriceSnapshot::capture(entry),
            ));
        }
        Ok(events)
    }

    /// Applies events to a working copy so later steps of one command see
    /// earlier ones, then hands them back.
    fn stage(&mut self, events: Vec<CartEvent>) -> Vec<CartEvent> {
        self.apply_events(events.iter().cloned());
        events
    }
}
