use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, Result, Snapshot, Version,
    store::{EventStore, EventStream, StreamAppend, conflict, record_commit, validate_commit},
};

/// In-memory event store.
///
/// Used by the tests and by the server when no database is configured. It
/// honours the same versioning and atomicity rules as the PostgreSQL store.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    fn current_version(events: &[EventEnvelope], aggregate_id: AggregateId) -> Version {
        events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn commit(&self, appends: Vec<StreamAppend>) -> Result<Vec<Version>> {
        validate_commit(&appends)?;

        let mut store = self.events.write().await;

        // Check every stream before writing anything.
        for append in &appends {
            let Some(aggregate_id) = append.aggregate_id() else {
                continue;
            };
            let current = Self::current_version(&store, aggregate_id);

            if let Some(expected) = append.options.expected_version
                && current != expected
            {
                return Err(conflict(aggregate_id, expected, current));
            }

            let first = append.events[0].version;
            if first != current.next() {
                let expected = append.options.expected_version.unwrap_or(current);
                return Err(conflict(aggregate_id, expected, current));
            }
        }

        record_commit(&appends);
        let mut versions = Vec::with_capacity(appends.len());
        for append in appends {
            versions.push(append.last_version());
            store.extend(append.events);
        }

        Ok(versions)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.get_events_for_aggregate_from_version(aggregate_id, Version::initial())
            .await
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let events = store
            .iter()
            .filter(|e| query.matches(e))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventStoreError;
    use crate::store::AppendOptions;

    fn event(aggregate_id: AggregateId, version: i64, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Cart")
            .event_type(event_type)
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();

        let version = store
            .append(
                vec![event(cart, 1, "CartOpened"), event(cart, 2, "LineItemAdded")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        assert_eq!(version, Version::new(2));
        let events = store.get_events_for_aggregate(cart).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, "LineItemAdded");
    }

    #[tokio::test]
    async fn stale_writer_gets_a_conflict() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();
        store
            .append(vec![event(cart, 1, "CartOpened")], AppendOptions::expect_new())
            .await
            .unwrap();

        // Two writers both loaded version 1.
        store
            .append(
                vec![event(cart, 2, "LineItemAdded")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();
        let result = store
            .append(
                vec![event(cart, 2, "LineItemAdded")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { actual, .. }) if actual == Version::new(2)
        ));
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn unchecked_append_still_rejects_duplicate_versions() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();
        store
            .append(vec![event(cart, 1, "CartOpened")], AppendOptions::new())
            .await
            .unwrap();

        let result = store
            .append(vec![event(cart, 1, "CartOpened")], AppendOptions::new())
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn commit_writes_all_streams_or_none() {
        let store = InMemoryEventStore::new();
        let product = AggregateId::new();
        let order = AggregateId::new();

        store
            .append(
                vec![event(product, 1, "ProductListed")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        // Product expectation is stale, so the order must not be written either.
        let result = store
            .commit(vec![
                StreamAppend::new(
                    vec![event(order, 1, "OrderPlaced")],
                    AppendOptions::expect_new(),
                ),
                StreamAppend::new(
                    vec![event(product, 1, "StockDecremented")],
                    AppendOptions::expect_new(),
                ),
            ])
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { aggregate_id, .. }) if aggregate_id == product
        ));
        assert_eq!(store.get_aggregate_version(order).await.unwrap(), None);

        let versions = store
            .commit(vec![
                StreamAppend::new(
                    vec![event(order, 1, "OrderPlaced")],
                    AppendOptions::expect_new(),
                ),
                StreamAppend::new(
                    vec![event(product, 2, "StockDecremented")],
                    AppendOptions::expect_version(Version::first()),
                ),
            ])
            .await
            .unwrap();

        assert_eq!(versions, vec![Version::first(), Version::new(2)]);
        assert_eq!(store.event_count().await, 3);
    }

    #[tokio::test]
    async fn reads_from_a_version() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();
        store
            .append(
                vec![
                    event(cart, 1, "CartOpened"),
                    event(cart, 2, "LineItemAdded"),
                    event(cart, 3, "LineItemRemoved"),
                ],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let tail = store
            .get_events_for_aggregate_from_version(cart, Version::new(2))
            .await
            .unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn query_pages_through_a_stream() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();
        let other = AggregateId::new();
        store
            .append(
                vec![
                    event(cart, 1, "CartOpened"),
                    event(cart, 2, "LineItemAdded"),
                    event(cart, 3, "LineItemAdded"),
                ],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(vec![event(other, 1, "CartOpened")], AppendOptions::new())
            .await
            .unwrap();

        let page = store
            .query_events(EventQuery::for_aggregate(cart).offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].version, Version::new(2));

        let added = store
            .query_events(EventQuery::new().event_type("LineItemAdded"))
            .await
            .unwrap();
        assert_eq!(added.len(), 2);
    }

    #[tokio::test]
    async fn streams_everything_in_commit_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let first = AggregateId::new();
        let second = AggregateId::new();
        store
            .append(vec![event(first, 1, "CartOpened")], AppendOptions::new())
            .await
            .unwrap();
        store
            .append(vec![event(second, 1, "CartOpened")], AppendOptions::new())
            .await
            .unwrap();

        let events: Vec<_> = store.stream_all_events().await.unwrap().collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, first);
    }

    #[tokio::test]
    async fn snapshots_replace_previous_ones() {
        let store = InMemoryEventStore::new();
        let cart = AggregateId::new();

        store
            .save_snapshot(Snapshot::new(
                cart,
                "Cart",
                Version::new(50),
                serde_json::json!({"lines": 1}),
            ))
            .await
            .unwrap();
        store
            .save_snapshot(Snapshot::new(
                cart,
                "Cart",
                Version::new(100),
                serde_json::json!({"lines": 2}),
            ))
            .await
            .unwrap();

        let snapshot = store.get_snapshot(cart).await.unwrap().unwrap();
        assert_eq!(snapshot.version, Version::new(100));
        assert!(store.get_snapshot(AggregateId::new()).await.unwrap().is_none());
    }
}
