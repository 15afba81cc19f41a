use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use axum::{middleware, routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use cart_rs::{
    handlers::{
        cors_middleware, create_admin_router, create_cart_router, create_member_router,
        health_check, metrics_handler, security_headers_middleware,
    },
    init_observability,
    observability::{observability_middleware, BusinessTracingMiddleware},
    repositories::{
        DynamoDbCartRepository, DynamoDbMemberRepository, MemberRepository, TableManager,
    },
    services::{CartService, MemberService},
    shutdown_observability, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_env()?;
    println!("Configuration loaded successfully");

    // Initialize comprehensive observability
    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        config.observability.enable_json_logging,
    )?;

    info!("Starting cart-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.database.region);
    info!(
        "DynamoDB Tables: members={}, carts={}",
        config.database.members_table_name, config.database.carts_table_name
    );

    // Initialize metrics
    let metrics = Arc::new(Metrics::new()?);
    let business_tracing = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));
    info!("Metrics initialized successfully");

    // Initialize AWS clients
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(config.database.region.clone()))
        .load()
        .await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));
    info!("AWS clients initialized successfully");

    // Initialize table manager
    let table_manager = Arc::new(TableManager::new(dynamodb_client.clone()));

    // Initialize repositories
    let member_repository: Arc<dyn MemberRepository> = Arc::new(DynamoDbMemberRepository::new(
        dynamodb_client.clone(),
        config.database.members_table_name.clone(),
        config.database.region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        dynamodb_client.clone(),
        config.database.carts_table_name.clone(),
        config.database.region.clone(),
    ));
    info!("Repositories initialized successfully");

    // Initialize services
    let member_service = Arc::new(MemberService::new(member_repository.clone()));
    let cart_service = Arc::new(CartService::new(cart_repository, member_service.clone()));
    info!("Services initialized successfully");

    // Build the application router
    let app = create_app(
        metrics,
        business_tracing,
        member_service,
        cart_service,
        member_repository,
        table_manager,
        config.database.members_table_name.clone(),
        config.database.carts_table_name.clone(),
    );

    // Create socket address
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn create_app(
    metrics: Arc<Metrics>,
    business_tracing: Arc<BusinessTracingMiddleware>,
    member_service: Arc<MemberService>,
    cart_service: Arc<CartService>,
    member_repository: Arc<dyn MemberRepository>,
    table_manager: Arc<TableManager>,
    members_table_name: String,
    carts_table_name: String,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health/status", get(health_check))
        .merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(metrics),
        )
        .merge(create_member_router(
            member_service.clone(),
            business_tracing.clone(),
        ))
        .merge(create_cart_router(
            cart_service,
            member_service,
            business_tracing,
        ))
        .merge(create_admin_router(
            member_repository,
            table_manager,
            members_table_name,
            carts_table_name,
        ))
        // Middleware layers (order matters - outer to inner)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
}
