//! Projection error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Streaming events out of the store failed.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A payload did not match the event enum of its aggregate type.
    #[error("Cannot decode {aggregate_type} event: {source}")]
    Payload {
        aggregate_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectionError {
    pub(crate) fn payload(aggregate_type: &str, source: serde_json::Error) -> Self {
        ProjectionError::Payload {
            aggregate_type: aggregate_type.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
