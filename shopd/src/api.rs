//! HTTP API for the shop daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Place an order
//! - Get an order (with items)
//! - Update an order's status
//! - List a customer's orders (headers only)
//!
//! Authentication happens upstream. The authenticated user arrives in the
//! `x-user-id` header; every order endpoint only serves the owner.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use shop_domain::{CustomerId, NewOrder, Order, OrderId, OrderStatus, UserId};
use shop_orders::{OrderError, OrderService};
use shop_store::Store;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<S: Store + 'static> {
    pub orders: OrderService<S>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request to change an order's status.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i32>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            product_id: None,
            available: None,
            requested: None,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Caller identity
// =============================================================================

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[async_trait]
impl<T: Send + Sync> FromRequestParts<T> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .filter(|id| *id > 0)
            .map(Caller)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::message("Missing or invalid user identity")),
                )
            })
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<S>(state: Arc<ApiState<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/orders", post(create_order_handler))
        .route("/v1/orders/:id", get(get_order_handler).put(update_order_handler))
        .route("/v1/customers/:id/orders", get(customer_orders_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Place an order for one of the caller's customers.
async fn create_order_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    caller: Caller,
    Json(request): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    S: Store + 'static,
{
    // Reject malformed input before any lookup
    request.validate().map_err(|e| to_error_response(e.into()))?;
    ensure_customer_owner(&state, caller, request.customer_id).await?;

    let order = state.orders.create_order(request).await.map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order with its items.
async fn get_order_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    caller: Caller,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError>
where
    S: Store + 'static,
{
    ensure_order_owner(&state, caller, id).await?;

    let order = state.orders.get_order_by_id(id).await.map_err(to_error_response)?;

    Ok(Json(order))
}

/// Overwrite an order's status.
async fn update_order_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    caller: Caller,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, ApiError>
where
    S: Store + 'static,
{
    ensure_order_owner(&state, caller, id).await?;

    let order = state
        .orders
        .update_order_status(id, request.status)
        .await
        .map_err(to_error_response)?;

    Ok(Json(order))
}

/// List a customer's orders (headers only).
async fn customer_orders_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    caller: Caller,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<Order>>, ApiError>
where
    S: Store + 'static,
{
    ensure_customer_owner(&state, caller, customer_id).await?;

    let orders = state
        .orders
        .get_orders_by_customer_id(customer_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(orders))
}

// =============================================================================
// Helpers
// =============================================================================

async fn ensure_order_owner<S: Store>(
    state: &ApiState<S>,
    caller: Caller,
    order_id: OrderId,
) -> Result<(), ApiError> {
    let owner = state.orders.get_owner_id(order_id).await.map_err(to_error_response)?;
    ensure_same_user(caller, owner)
}

async fn ensure_customer_owner<S: Store>(
    state: &ApiState<S>,
    caller: Caller,
    customer_id: CustomerId,
) -> Result<(), ApiError> {
    let customer = state
        .orders
        .store()
        .customers()
        .find_by_id(customer_id)
        .await
        .map_err(|e| to_error_response(e.into()))?
        .ok_or_else(|| to_error_response(OrderError::not_found("customer", customer_id)))?;
    ensure_same_user(caller, customer.user_id)
}

fn ensure_same_user(caller: Caller, owner: UserId) -> Result<(), ApiError> {
    if caller.0 == owner {
        return Ok(());
    }

    warn!(user_id = caller.0, owner_id = owner, "Access to foreign resource denied");
    Err((
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::message("Not the owner of this resource")),
    ))
}

fn to_error_response(error: OrderError) -> ApiError {
    let status = match &error {
        OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut body = ErrorResponse::message(error.to_string());
    if let OrderError::InsufficientStock { product_id, available, requested } = error {
        body.product_id = Some(product_id);
        body.available = Some(available);
        body.requested = Some(requested);
    }

    (status, Json(body))
}

// =============================================================================
// Tests
// =============================================================================
