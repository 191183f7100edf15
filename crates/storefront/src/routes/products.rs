//! Catalog administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use commerce::{Aggregate, ListProduct, Money, Product, ProductId};
use event_store::{EventStore, Version};
use projections::StockLevel;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ProductResponse {
    pub sku: ProductId,
    pub name: String,
    pub localized_name: Option<String>,
    pub category: String,
    pub image: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub in_stock: bool,
    pub version: Version,
    pub listed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku().clone(),
            name: product.name().to_string(),
            localized_name: product.localized_name().map(str::to_string),
            category: product.category().to_string(),
            image: product.image().map(str::to_string),
            price: product.price(),
            stock: product.stock(),
            in_stock: product.in_stock(),
            version: product.version(),
            listed_at: product.listed_at(),
            updated_at: product.updated_at(),
        }
    }
}

#[derive(Deserialize)]
pub struct StockQuery {
    /// Only products with at most this many units left.
    pub low_stock: Option<u32>,
}

#[derive(Deserialize)]
pub struct RepriceRequest {
    pub price: Money,
}

#[derive(Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// POST /products
#[tracing::instrument(skip(state, cmd), fields(sku = %cmd.sku))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(cmd): Json<ListProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.catalog.list_product(cmd).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /products
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    state.refresh_views().await?;
    let levels = match query.low_stock {
        Some(threshold) => state.stock_levels.low_stock(threshold).await,
        None => state.stock_levels.all().await,
    };
    Ok(Json(levels))
}

/// GET /products/{sku}
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(sku.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {sku} not found")))?;
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /products/{sku}/price
pub async fn reprice<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    Json(req): Json<RepriceRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.reprice(&ProductId::new(sku), req.price).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /products/{sku}/restock
pub async fn restock<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    Json(req): Json<QuantityRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.restock(&ProductId::new(sku), req.quantity).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /products/{sku}/purchases
pub async fn track_purchase<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    Json(req): Json<QuantityRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .track_purchase(&ProductId::new(sku), req.quantity)
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}
