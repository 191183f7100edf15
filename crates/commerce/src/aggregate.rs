//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded on a stream, named in the past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name stored alongside the payload.
    fn event_type(&self) -> &'static str;
}

/// An event-sourced consistency boundary.
///
/// State is rebuilt by replaying events through [`Aggregate::apply`], which
/// must be pure: the same state and event always give the same result, and
/// applying never fails. Commands are plain methods on the aggregate that
/// inspect the current state and return the events to record.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors its commands can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the stream kind ("Product", "Cart", "Order").
    fn aggregate_type() -> &'static str;

    /// Returns the stream id, or None for an aggregate with no events yet.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the version of the last applied event.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Aggregates whose state is periodically captured so loading can skip
/// replaying the full stream.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Number of events between snapshots.
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        let version = self.version().as_i64();
        version > 0 && (version as usize).is_multiple_of(Self::snapshot_interval())
    }
}
