use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, instrument, Span};
use uuid::Uuid;

use super::Metrics;

/// Middleware for automatic request tracing and metrics collection
#[instrument(skip_all, fields(
    request_id = %Uuid::new_v4(),
    method = %request.method(),
    uri = %request.uri(),
))]
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    // Prefer the matched path for endpoint grouping
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| uri.clone());

    let current_span = Span::current();
    current_span.record("endpoint", &endpoint);

    metrics.increment_in_flight(&method, &endpoint);

    info!("Processing request");

    let response = next.run(request).await;

    let duration = start_time.elapsed();
    let status_code = response.status().as_u16();

    metrics.record_http_request(&method, &endpoint, status_code, duration.as_secs_f64());
    metrics.decrement_in_flight(&method, &endpoint);

    if status_code >= 400 {
        error!(
            status_code = status_code,
            duration_ms = duration.as_millis(),
            "Request completed with error"
        );
    } else {
        info!(
            status_code = status_code,
            duration_ms = duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Middleware for business operation tracing
pub struct BusinessTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl BusinessTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Trace a cart operation
    #[instrument(skip_all, fields(operation = %operation))]
    pub async fn trace_cart_operation<F, T, E>(&self, operation: &str, future: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();

        info!("Starting cart operation");

        match future.await {
            Ok(result) => {
                self.metrics.record_cart_operation(operation, true);

                info!(
                    duration_ms = start_time.elapsed().as_millis(),
                    "Cart operation completed successfully"
                );

                Ok(result)
            }
            Err(error) => {
                self.metrics.record_cart_operation(operation, false);

                error!(
                    error = %error,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Cart operation failed"
                );

                Err(error)
            }
        }
    }

    /// Trace a member operation
    #[instrument(skip_all, fields(operation = %operation))]
    pub async fn trace_member_operation<F, T, E>(&self, operation: &str, future: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();

        info!("Starting member operation");

        match future.await {
            Ok(result) => {
                self.metrics.record_member_operation(operation, true);

                info!(
                    duration_ms = start_time.elapsed().as_millis(),
                    "Member operation completed successfully"
                );

                Ok(result)
            }
            Err(error) => {
                self.metrics.record_member_operation(operation, false);

                error!(
                    error = %error,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Member operation failed"
                );

                Err(error)
            }
        }
    }
}
