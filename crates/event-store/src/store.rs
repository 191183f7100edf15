use std::collections::HashSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version};

/// Options for appending events to a stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendOptions {
    /// Expected version of the stream for optimistic concurrency control.
    /// If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the stream to have no events yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }

    /// Expects `version`, treating the initial version as "must be new".
    pub fn after(version: Version) -> Self {
        if version == Version::initial() {
            Self::expect_new()
        } else {
            Self::expect_version(version)
        }
    }
}

/// Events destined for one stream inside a multi-stream commit.
#[derive(Debug, Clone)]
pub struct StreamAppend {
    pub events: Vec<EventEnvelope>,
    pub options: AppendOptions,
}

impl StreamAppend {
    pub fn new(events: Vec<EventEnvelope>, options: AppendOptions) -> Self {
        Self { events, options }
    }

    /// The stream targeted by this append, if it carries any events.
    pub fn aggregate_id(&self) -> Option<AggregateId> {
        self.events.first().map(|e| e.aggregate_id)
    }

    /// The version the stream ends at once this append lands.
    pub fn last_version(&self) -> Version {
        self.events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial())
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends to several streams as one unit.
    ///
    /// Every stream's expected version is checked before anything is written;
    /// either all events land or none do. Returns the new version of each
    /// stream in the order the appends were given.
    async fn commit(&self, appends: Vec<StreamAppend>) -> Result<Vec<Version>>;

    /// Appends events to a single stream.
    ///
    /// Fails with `ConcurrencyConflict` if `options.expected_version` is set
    /// and does not match. Returns the new version of the stream.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        self.commit(vec![StreamAppend::new(events, options)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EventStoreError::InvalidAppend("commit returned no version".into()))
    }

    /// Retrieves all events for a specific stream, oldest first.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves the events of a stream starting from a specific version.
    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Streams every event in the store in commit order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current version of a stream, or None if it has no events.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    /// Saves a snapshot, replacing any previous one for the stream.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for a stream.
    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Loads a stream's events, starting after its snapshot when one exists.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(aggregate_id).await? {
            let events = self
                .get_events_for_aggregate_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.get_events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates one stream's events before they are written.
///
/// All events must target the same stream and carry sequential versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty event list".into(),
        ));
    };

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id || event.aggregate_type != first.aggregate_type
        {
            return Err(EventStoreError::InvalidAppend(
                "all events of an append must target the same stream".into(),
            ));
        }
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {expected_version}, got {}",
                event.version
            )));
        }
    }

    Ok(())
}

/// Validates a multi-stream commit: each append is well formed and no stream
/// appears twice.
pub fn validate_commit(appends: &[StreamAppend]) -> Result<()> {
    if appends.is_empty() {
        return Err(EventStoreError::InvalidAppend("empty commit".into()));
    }

    let mut seen = HashSet::new();
    for append in appends {
        validate_events_for_append(&append.events)?;
        if let Some(id) = append.aggregate_id()
            && !seen.insert(id)
        {
            return Err(EventStoreError::InvalidAppend(format!(
                "stream {id} appears more than once in a commit"
            )));
        }
    }

    Ok(())
}

/// Builds a version conflict error and counts it.
pub(crate) fn conflict(aggregate_id: AggregateId, expected: Version, actual: Version) -> EventStoreError {
    metrics::counter!("event_store_conflicts_total").increment(1);
    tracing::debug!(%aggregate_id, %expected, %actual, "stream version conflict");
    EventStoreError::ConcurrencyConflict {
        aggregate_id,
        expected,
        actual,
    }
}

pub(crate) fn record_commit(appends: &[StreamAppend]) {
    let events: usize = appends.iter().map(|append| append.events.len()).sum();
    metrics::counter!("event_store_events_appended_total").increment(events as u64);
    tracing::trace!(streams = appends.len(), events, "commit written");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Product")
            .event_type("StockDecremented")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn after_initial_means_new_stream() {
        assert_eq!(
            AppendOptions::after(Version::initial()).expected_version,
            Some(Version::initial())
        );
        assert_eq!(
            AppendOptions::after(Version::new(3)).expected_version,
            Some(Version::new(3))
        );
    }

    #[test]
    fn rejects_gaps_in_versions() {
        let id = AggregateId::new();
        let result = validate_events_for_append(&[event(id, 1), event(id, 3)]);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn rejects_mixed_streams() {
        let result = validate_events_for_append(&[
            event(AggregateId::new(), 1),
            event(AggregateId::new(), 2),
        ]);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn rejects_the_same_stream_twice_in_a_commit() {
        let id = AggregateId::new();
        let appends = vec![
            StreamAppend::new(vec![event(id, 1)], AppendOptions::new()),
            StreamAppend::new(vec![event(id, 2)], AppendOptions::new()),
        ];
        assert!(matches!(
            validate_commit(&appends),
            Err(EventStoreError::InvalidAppend(_))
        ));
    }

    #[test]
    fn accepts_independent_streams() {
        let appends = vec![
            StreamAppend::new(vec![event(AggregateId::new(), 1)], AppendOptions::new()),
            StreamAppend::new(
                vec![event(AggregateId::new(), 4), event(AggregateId::new(), 5)],
                AppendOptions::new(),
            ),
        ];
        // second append mixes streams
        assert!(validate_commit(&appends).is_err());

        let id = AggregateId::new();
        let appends = vec![
            StreamAppend::new(vec![event(AggregateId::new(), 1)], AppendOptions::new()),
            StreamAppend::new(vec![event(id, 4), event(id, 5)], AppendOptions::new()),
        ];
        assert!(validate_commit(&appends).is_ok());
        assert_eq!(appends[1].last_version(), Version::new(5));
    }
}
