//! Request extractors for caller identity and path ids.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use commerce::{CustomerId, LineItemId};
use common::AggregateId;

use crate::error::ApiError;

/// Header carrying the authenticated customer id.
pub const CUSTOMER_HEADER: &str = "x-customer-id";

/// The calling customer; rejects the request when the header is missing.
#[derive(Debug, Clone, Copy)]
pub struct Customer(pub CustomerId);

/// The calling customer if one identified itself; guests get `None`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeCustomer(pub Option<CustomerId>);

fn customer_from(parts: &Parts) -> Result<Option<CustomerId>, ApiError> {
    let Some(value) = parts.headers.get(CUSTOMER_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("{CUSTOMER_HEADER} is not valid text")))?;
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {CUSTOMER_HEADER}: {e}")))
}

impl<S: Send + Sync> FromRequestParts<S> for Customer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        customer_from(parts)?
            .map(Customer)
            .ok_or_else(|| ApiError::BadRequest(format!("{CUSTOMER_HEADER} header is required")))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        customer_from(parts).map(MaybeCustomer)
    }
}

pub fn parse_order_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

pub fn parse_line_id(id: &str) -> Result<LineItemId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid line id: {e}")))
}
