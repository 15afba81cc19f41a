use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{MemberResponse, ServiceError};
use crate::observability::BusinessTracingMiddleware;
use crate::services::MemberService;

/// State for member handlers
#[derive(Clone)]
pub struct MemberHandlerState {
    pub member_service: Arc<MemberService>,
    pub tracing: Arc<BusinessTracingMiddleware>,
}

/// Create member router with all endpoints
pub fn create_member_router(
    member_service: Arc<MemberService>,
    tracing: Arc<BusinessTracingMiddleware>,
) -> Router {
    let state = MemberHandlerState {
        member_service,
        tracing,
    };

    Router::new()
        .route("/api/members", get(list_members))
        .with_state(state)
}

/// List every registered member
#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<MemberHandlerState>,
) -> Result<Json<Vec<MemberResponse>>, (StatusCode, Json<Value>)> {
    info!("Listing members");

    match state
        .tracing
        .trace_member_operation("find_all", state.member_service.find_all())
        .await
    {
        Ok(members) => {
            info!("Successfully listed {} members", members.len());
            Ok(Json(members))
        }
        Err(err) => {
            error!("Failed to list members: {}", err);
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
