//! Maintenance endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{TimeDelta, Utc};
use commerce::Cart;
use event_store::EventStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct PurgeResponse {
    pub candidates: usize,
    pub purged: usize,
}

/// POST /admin/carts/purge
///
/// Empties every cart idle for longer than the cart idle limit.
#[tracing::instrument(skip(state))]
pub async fn purge_carts<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<PurgeResponse>, ApiError> {
    state.refresh_views().await?;

    let now = Utc::now();
    let cutoff = now - TimeDelta::days(Cart::IDLE_LIMIT_DAYS);
    let candidates = state.cart_activity.idle_since(cutoff).await;
    let count = candidates.len();
    let purged = state.carts.purge_idle_carts(candidates, now).await?;

    tracing::info!(candidates = count, purged, "idle carts purged");
    Ok(Json(PurgeResponse {
        candidates: count,
        purged,
    }))
}
