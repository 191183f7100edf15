//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_store::EventEnvelope;
use serde::de::DeserializeOwned;

use crate::{ProjectionError, Result};

/// How far into the global event log a projection has read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Events seen, including those the projection ignored.
    pub events_processed: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }

    /// Returns whether the event at 1-based `index` in the log is still unseen.
    pub fn is_behind(&self, index: u64) -> bool {
        self.events_processed < index
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// Folds events into a read model.
///
/// Every event in the log is handed to every projection, in order. A
/// projection must advance its position for each one, including events of
/// aggregate types it does not care about, so that catch-up can resume
/// where it left off.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Clears the read model and rewinds to position zero.
    async fn reset(&self) -> Result<()>;
}

/// Decodes the payload when the envelope belongs to `aggregate_type`.
pub(crate) fn decode_if<T: DeserializeOwned>(
    event: &EventEnvelope,
    aggregate_type: &str,
) -> Result<Option<T>> {
    if event.aggregate_type != aggregate_type {
        return Ok(None);
    }
    serde_json::from_value(event.payload.clone())
        .map(Some)
        .map_err(|err| ProjectionError::payload(aggregate_type, err))
}
