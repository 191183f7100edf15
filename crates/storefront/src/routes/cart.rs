//! Cart endpoints. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use commerce::{AddToCart, CartSummary};
use event_store::EventStore;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Customer, parse_line_id};

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pub items: Vec<AddToCart>,
}

/// GET /cart
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
) -> Result<Json<CartSummary>, ApiError> {
    Ok(Json(state.carts.get_or_create(customer_id).await?))
}

/// POST /cart/items
#[tracing::instrument(skip(state, item), fields(sku = %item.sku))]
pub async fn add_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
    Json(item): Json<AddToCart>,
) -> Result<Json<CartSummary>, ApiError> {
    Ok(Json(state.carts.add_item(customer_id, item).await?))
}

/// PATCH /cart/items/{line_id}
pub async fn update_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
    Path(line_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    let line_id = parse_line_id(&line_id)?;
    Ok(Json(
        state
            .carts
            .update_item(customer_id, line_id, req.quantity)
            .await?,
    ))
}

/// DELETE /cart/items/{line_id}
pub async fn remove_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
    Path(line_id): Path<String>,
) -> Result<Json<CartSummary>, ApiError> {
    let line_id = parse_line_id(&line_id)?;
    Ok(Json(state.carts.remove_item(customer_id, line_id).await?))
}

/// DELETE /cart
pub async fn clear<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
) -> Result<Json<CartSummary>, ApiError> {
    Ok(Json(state.carts.clear(customer_id).await?))
}

/// POST /cart/merge
///
/// Folds a guest cart into the caller's cart after sign-in.
#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn merge<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
    Json(req): Json<MergeRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    Ok(Json(state.carts.merge(customer_id, req.items).await?))
}

/// POST /cart/refresh
pub async fn refresh<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
) -> Result<Json<CartSummary>, ApiError> {
    Ok(Json(state.carts.refresh_prices(customer_id).await?))
}
