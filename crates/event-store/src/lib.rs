//! Append-only event storage with optimistic versioning.
//!
//! Streams are identified by [`AggregateId`]; every event carries the stream
//! [`Version`] it was written at. [`EventStore::commit`] writes to several
//! streams as one unit, which is how an order and the stock it consumes land
//! together.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream, StreamAppend};
