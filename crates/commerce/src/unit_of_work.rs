//! Multi-stream atomic writes.

use common::AggregateId;
use event_store::{AppendOptions, EventStore, StreamAppend, Version};

use crate::aggregate::Aggregate;
use crate::command::build_envelopes;
use crate::error::DomainError;

/// Collects events for several aggregates and writes them in one commit.
///
/// Each recorded aggregate is checked against the version it was loaded at;
/// if any stream moved on, the whole unit is rejected and nothing is written.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    appends: Vec<StreamAppend>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `events` for `aggregate` and applies them to it in place.
    ///
    /// The aggregate reflects the staged state even if the commit later
    /// fails, so callers must discard it in that case.
    pub fn record<A: Aggregate>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate: &mut A,
        events: Vec<A::Event>,
    ) -> Result<Version, DomainError> {
        let loaded_at = aggregate.version();
        if events.is_empty() {
            return Ok(loaded_at);
        }

        let envelopes = build_envelopes::<A>(aggregate_id, loaded_at, &events)?;
        let append = StreamAppend::new(envelopes, AppendOptions::after(loaded_at));
        let new_version = append.last_version();

        aggregate.apply_events(events);
        aggregate.set_version(new_version);
        self.appends.push(append);

        Ok(new_version)
    }

    pub fn is_empty(&self) -> bool {
        self.appends.is_empty()
    }

    /// Number of streams touched.
    pub fn len(&self) -> usize {
        self.appends.len()
    }

    /// Writes every staged stream atomically.
    pub async fn commit<S: EventStore + ?Sized>(self, store: &S) -> Result<Vec<Version>, DomainError> {
        if self.appends.is_empty() {
            return Ok(Vec::new());
        }
        Ok(store.commit(self.appends).await?)
    }
}
