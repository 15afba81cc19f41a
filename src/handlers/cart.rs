use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::handlers::auth::AuthenticatedMember;
use crate::models::{CartResponse, ServiceError};
use crate::observability::BusinessTracingMiddleware;
use crate::services::{CartService, MemberService};

/// Response for a successful cart addition
#[derive(Debug, Serialize)]
pub struct AddCartResponse {
    pub cart_id: i64,
}

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub cart_service: Arc<CartService>,
    pub member_service: Arc<MemberService>,
    pub tracing: Arc<BusinessTracingMiddleware>,
}

impl FromRef<CartHandlerState> for Arc<MemberService> {
    fn from_ref(state: &CartHandlerState) -> Self {
        state.member_service.clone()
    }
}

/// Create cart router with all endpoints
pub fn create_cart_router(
    cart_service: Arc<CartService>,
    member_service: Arc<MemberService>,
    tracing: Arc<BusinessTracingMiddleware>,
) -> Router {
    let state = CartHandlerState {
        cart_service,
        member_service,
        tracing,
    };

    Router::new()
        .route("/api/carts", get(list_cart_items))
        .route(
            "/api/carts/:id",
            post(add_cart_item).delete(delete_cart_item),
        )
        .route(
            "/api/carts/products/:product_id",
            delete(delete_cart_items_by_product),
        )
        .with_state(state)
}

/// List the authenticated member's cart items
#[instrument(skip(state, member))]
pub async fn list_cart_items(
    State(state): State<CartHandlerState>,
    AuthenticatedMember(member): AuthenticatedMember,
) -> Result<Json<Vec<CartResponse>>, (StatusCode, Json<Value>)> {
    info!("Listing cart items");

    match state
        .tracing
        .trace_cart_operation(
            "find_by_member_request",
            state.cart_service.find_by_member_request(&member),
        )
        .await
    {
        Ok(carts) => {
            info!("Successfully listed {} cart items", carts.len());
            Ok(Json(carts))
        }
        Err(err) => {
            error!("Failed to list cart items: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Add a product to the authenticated member's cart
#[instrument(skip(state, member), fields(product_id = %product_id))]
pub async fn add_cart_item(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<i64>,
    AuthenticatedMember(member): AuthenticatedMember,
) -> Result<(StatusCode, Json<AddCartResponse>), (StatusCode, Json<Value>)> {
    info!("Adding product {} to cart", product_id);

    match state
        .tracing
        .trace_cart_operation("add_cart", state.cart_service.add_cart(product_id, &member))
        .await
    {
        Ok(cart_id) => {
            info!("Successfully added cart item with id {}", cart_id);
            Ok((StatusCode::CREATED, Json(AddCartResponse { cart_id })))
        }
        Err(err) => {
            error!("Failed to add cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Delete one of the authenticated member's cart items by its id
#[instrument(skip(state, member), fields(cart_id = %cart_id))]
pub async fn delete_cart_item(
    State(state): State<CartHandlerState>,
    Path(cart_id): Path<i64>,
    AuthenticatedMember(member): AuthenticatedMember,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    info!("Deleting cart item {}", cart_id);

    match state
        .tracing
        .trace_cart_operation(
            "delete_by_cart_id_and_member_id",
            state
                .cart_service
                .delete_by_cart_id_and_member_id(cart_id, member.member_id),
        )
        .await
    {
        Ok(()) => {
            info!("Successfully deleted cart item");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("Failed to delete cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Delete a product from every member's cart
#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn delete_cart_items_by_product(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    info!("Deleting cart items for product {}", product_id);

    match state
        .tracing
        .trace_cart_operation(
            "delete_by_product_id",
            state.cart_service.delete_by_product_id(product_id),
        )
        .await
    {
        Ok(()) => {
            info!("Successfully deleted cart items for product");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("Failed to delete cart items for product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::Repository { source } => match source {
            crate::models::RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            crate::models::RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            crate::models::RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
