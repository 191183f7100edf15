//! Domain error types.

use event_store::EventStoreError;
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::order::OrderError;
use crate::validation::ValidationErrors;

/// Coarse classification callers use to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; fixable by the caller.
    Validation,
    /// A referenced product, cart line or order does not exist.
    NotFound,
    /// The request is well formed but not allowed in the current state.
    State,
    /// Another writer changed the same stream first.
    Conflict,
    /// Storage or serialization failure.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::State => "state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                ErrorKind::Conflict
            }
            DomainError::EventStore(_) | DomainError::Serialization(_) => ErrorKind::Storage,
            DomainError::Catalog(e) => e.kind(),
            DomainError::Cart(e) => e.kind(),
            DomainError::Order(e) => e.kind(),
            DomainError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Field-level detail, present for validation failures only.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            DomainError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use event_store::Version;

    use crate::order::OrderStatus;
    use crate::value_objects::ProductId;

    #[test]
    fn classifies_each_family() {
        let conflict = DomainError::from(EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::new(),
            expected: Version::first(),
            actual: Version::new(2),
        });
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let missing = DomainError::from(CatalogError::ProductNotFound {
            sku: ProductId::new("MALA-108"),
        });
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let illegal = DomainError::from(OrderError::InvalidStateTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(illegal.kind(), ErrorKind::State);

        let invalid = DomainError::from(ValidationErrors::single("quantity", "must be at least 1"));
        assert_eq!(invalid.kind(), ErrorKind::Validation);
        assert!(invalid.validation_errors().is_some());

        let storage = DomainError::from(EventStoreError::InvalidAppend("empty".into()));
        assert_eq!(storage.kind(), ErrorKind::Storage);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(
            serde_json::to_value(ErrorKind::Conflict).unwrap(),
            serde_json::json!("conflict")
        );
    }
}
