//! Order placement, checkout and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use commerce::order::{AdminNote, PaymentDetails};
use commerce::{
    AdminUpdate, Aggregate, CheckoutCart, CustomerId, CustomerInfo, Money, Order, OrderLine,
    OrderStatus, PlaceOrder, Pricing, ShippingAddress, TrackingInfo,
};
use common::AggregateId;
use event_store::{EventQuery, EventStore, Version};
use projections::{OrderPage, OrderSummary};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Customer, MaybeCustomer, parse_order_id};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_EVENT_LIMIT: usize = 100;

// -- Request types --

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct BoardQuery {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderLineResponse {
    #[serde(flatten)]
    pub line: OrderLine,
    pub line_total: Money,
}

/// Full order detail. Every amount in `pricing` is derived from the lines
/// and charges.
#[derive(Serialize)]
pub struct OrderResponse {
    pub id: Option<AggregateId>,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub customer: Option<CustomerInfo>,
    pub shipping_address: Option<ShippingAddress>,
    pub lines: Vec<OrderLineResponse>,
    pub pricing: Pricing,
    pub status: OrderStatus,
    pub payment: PaymentDetails,
    pub tracking: Option<TrackingInfo>,
    pub notes: Option<String>,
    pub admin_notes: Vec<AdminNote>,
    pub cancellation_reason: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: Version,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().to_string(),
            customer_id: order.customer_id(),
            customer: order.customer().cloned(),
            shipping_address: order.shipping_address().cloned(),
            lines: order
                .lines()
                .iter()
                .map(|line| OrderLineResponse {
                    line_total: line.line_total(),
                    line: line.clone(),
                })
                .collect(),
            pricing: order.pricing(),
            status: order.status(),
            payment: order.payment().clone(),
            tracking: order.tracking().cloned(),
            notes: order.notes().map(str::to_string),
            admin_notes: order.admin_notes().to_vec(),
            cancellation_reason: order.cancellation_reason().map(str::to_string),
            placed_at: order.placed_at(),
            confirmed_at: order.confirmed_at(),
            shipped_at: order.shipped_at(),
            delivered_at: order.delivered_at(),
            cancelled_at: order.cancelled_at(),
            refunded_at: order.refunded_at(),
            updated_at: order.updated_at(),
            version: order.version(),
        }
    }
}

#[derive(Serialize)]
pub struct MyOrdersResponse {
    pub placed: usize,
    pub active: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub total_spent: Money,
    pub orders: Vec<OrderSummary>,
}

#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub version: i64,
    pub timestamp: String,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /orders
///
/// Places an order for explicit items. The customer is taken from the
/// identity header, never from the body; without it the order is a guest
/// order.
#[tracing::instrument(skip(state, cmd), fields(items = cmd.items.len()))]
pub async fn place<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MaybeCustomer(customer_id): MaybeCustomer,
    Json(mut cmd): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    cmd.customer_id = customer_id;
    let order = state.orders.place_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// POST /orders/checkout
///
/// Places an order from the caller's cart and empties the cart.
#[tracing::instrument(skip(state, details))]
pub async fn checkout<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
    Json(details): Json<CheckoutCart>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.orders.checkout_cart(customer_id, details).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders
pub async fn board<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<OrderPage>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    state.refresh_views().await?;
    let page = state
        .order_board
        .list(status, query.page.unwrap_or(1), per_page)
        .await;
    Ok(Json(page))
}

/// GET /orders/mine
pub async fn mine<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Customer(customer_id): Customer,
) -> Result<Json<MyOrdersResponse>, ApiError> {
    state.refresh_views().await?;

    let Some(history) = state.customer_orders.get(customer_id).await else {
        return Ok(Json(MyOrdersResponse {
            placed: 0,
            active: 0,
            delivered: 0,
            cancelled: 0,
            total_spent: Money::zero(),
            orders: Vec::new(),
        }));
    };

    let mut orders = Vec::with_capacity(history.order_ids.len());
    for order_id in &history.order_ids {
        if let Some(summary) = state.order_board.get(*order_id).await {
            orders.push(summary);
        }
    }

    Ok(Json(MyOrdersResponse {
        placed: history.placed,
        active: history.active,
        delivered: history.delivered,
        cancelled: history.cancelled,
        total_spent: history.total_spent,
        orders,
    }))
}

/// GET /orders/{id}
///
/// A customer identifying itself only sees its own orders; anyone else's
/// order reads as not found.
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MaybeCustomer(caller): MaybeCustomer,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get_order(order_id)
        .await?
        .filter(|order| caller.is_none() || order.customer_id() == caller)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/status
#[tracing::instrument(skip(state, req), fields(to = %req.status))]
pub async fn update_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .update_status(order_id, req.status, req.reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.cancel_order(order_id, req.reason).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PATCH /orders/{id}/admin
#[tracing::instrument(skip(state, update))]
pub async fn update_admin<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(update): Json<AdminUpdate>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.update_admin(order_id, update).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id}/events
///
/// The order's audit trail, oldest first.
pub async fn events<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    if state.store.get_aggregate_version(order_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }

    let envelopes = state
        .store
        .query_events(
            EventQuery::for_aggregate(order_id)
                .aggregate_type(Order::aggregate_type())
                .limit(query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_PAGE_SIZE))
                .offset(query.offset.unwrap_or(0)),
        )
        .await?;

    let responses = envelopes
        .into_iter()
        .map(|e| EventEnvelopeResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            version: e.version.as_i64(),
            timestamp: e.timestamp.to_rfc3339(),
            payload: e.payload,
        })
        .collect();
    Ok(Json(responses))
}
