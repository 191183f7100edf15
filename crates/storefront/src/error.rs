//! API error type with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commerce::{DomainError, ErrorKind, FieldError};
use projections::ProjectionError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed path, header or query input.
    BadRequest(String),
    NotFound(String),
    Domain(DomainError),
    /// A read model could not be brought up to date.
    Projection(ProjectionError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "no_fields")]
    fields: &'a [FieldError],
}

fn no_fields(fields: &&[FieldError]) -> bool {
    fields.is_empty()
}

impl ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Domain(err) => err.kind(),
            ApiError::Projection(_) => ErrorKind::Storage,
        }
    }
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::State | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        let (message, fields) = match &self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg.clone(), &[][..]),
            ApiError::Domain(err) => (
                err.to_string(),
                err.validation_errors()
                    .map(|errors| errors.errors())
                    .unwrap_or(&[]),
            ),
            ApiError::Projection(err) => (err.to_string(), &[][..]),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        } else {
            tracing::debug!(error = %message, kind = kind.as_str(), "request rejected");
        }

        let body = ErrorBody {
            error: message,
            kind: kind.as_str(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<event_store::EventStoreError> for ApiError {
    fn from(err: event_store::EventStoreError) -> Self {
        ApiError::Domain(err.into())
    }
}

#[cfg(test)]
mod tests {
    use commerce::{CartError, OrderError, OrderStatus, ValidationErrors};

    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::State), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Storage), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_errors_use_their_kind() {
        let illegal: ApiError = DomainError::from(OrderError::InvalidStateTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        })
        .into();
        assert_eq!(illegal.into_response().status(), StatusCode::CONFLICT);

        let empty: ApiError = DomainError::from(CartError::EmptyCart).into();
        assert_eq!(empty.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validation_body_lists_fields() {
        let err: ApiError =
            DomainError::from(ValidationErrors::single("customer.email", "is required")).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["fields"][0]["field"], "customer.email");
    }

    #[tokio::test]
    async fn other_bodies_omit_fields() {
        let response = ApiError::NotFound("Order x not found".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert!(json.get("fields").is_none());
    }
}
