use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::Member;
use crate::repositories::{MemberRepository, TableManager};

/// Admin state containing storage management collaborators
#[derive(Clone)]
pub struct AdminState {
    pub member_repository: Arc<dyn MemberRepository>,
    pub table_manager: Arc<TableManager>,
    pub members_table_name: String,
    pub carts_table_name: String,
}

/// Response for seeding operations
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub members_created: usize,
    pub timestamp: String,
}

/// Response for cleanup operations
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub tables_deleted: Vec<String>,
    pub timestamp: String,
}

/// Response for table setup operations
#[derive(Debug, Serialize)]
pub struct SetupTablesResponse {
    pub message: String,
    pub tables_created: Vec<String>,
    pub timestamp: String,
}

/// Create admin router with database management endpoints
pub fn create_admin_router(
    member_repository: Arc<dyn MemberRepository>,
    table_manager: Arc<TableManager>,
    members_table_name: String,
    carts_table_name: String,
) -> Router {
    let state = AdminState {
        member_repository,
        table_manager,
        members_table_name,
        carts_table_name,
    };

    Router::new()
        .route("/api/admin/setup-tables", post(setup_tables))
        .route("/api/admin/seed", post(seed_database))
        .route("/api/admin/cleanup", post(cleanup_database))
        .with_state(state)
}

/// Set up the required DynamoDB tables
#[instrument(skip(state))]
pub async fn setup_tables(
    State(state): State<AdminState>,
) -> Result<Json<SetupTablesResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Setting up DynamoDB tables");

    match state
        .table_manager
        .create_all_tables(&state.members_table_name, &state.carts_table_name)
        .await
    {
        Ok(()) => {
            let tables_created = vec![
                state.members_table_name.clone(),
                state.carts_table_name.clone(),
            ];

            info!("Successfully created tables: {:?}", tables_created);

            Ok(Json(SetupTablesResponse {
                message: format!("Successfully created {} tables", tables_created.len()),
                tables_created,
                timestamp,
            }))
        }
        Err(err) => {
            error!("Failed to create tables: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create tables",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}

/// Seed the database with demo members
#[instrument(skip(state))]
pub async fn seed_database(
    State(state): State<AdminState>,
) -> Result<Json<SeedResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Seeding database with demo members");

    let sample_members = create_sample_members();
    let mut created_count = 0;
    let mut errors = Vec::new();

    for member in sample_members {
        let email = member.email.clone();
        match state.member_repository.save(member).await {
            Ok(_) => {
                created_count += 1;
                info!("Successfully seeded member: {}", email);
            }
            Err(err) => {
                warn!("Failed to seed member {}: {}", email, err);
                errors.push(format!("{}: {}", email, err));
            }
        }
    }

    if errors.is_empty() {
        info!("Successfully seeded database with {} members", created_count);

        Ok(Json(SeedResponse {
            message: format!("Database seeded successfully with {} members", created_count),
            members_created: created_count,
            timestamp,
        }))
    } else if created_count > 0 {
        warn!("Database seeding completed with {} errors", errors.len());

        Ok(Json(SeedResponse {
            message: format!(
                "Database seeded with {} members, {} errors occurred",
                created_count,
                errors.len()
            ),
            members_created: created_count,
            timestamp,
        }))
    } else {
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to seed database",
                "details": errors,
                "timestamp": timestamp,
            })),
        ))
    }
}

/// Clean up the database by dropping both tables
#[instrument(skip(state))]
pub async fn cleanup_database(
    State(state): State<AdminState>,
) -> Result<Json<CleanupResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Cleaning up database");

    let tables = vec![
        state.members_table_name.clone(),
        state.carts_table_name.clone(),
    ];
    let mut tables_deleted = Vec::new();
    let mut errors = Vec::new();

    for table in &tables {
        match state.table_manager.delete_table(table).await {
            Ok(()) => {
                info!("Successfully deleted table: {}", table);
                tables_deleted.push(table.clone());
            }
            Err(err) => {
                warn!("Failed to delete table {}: {}", table, err);
                errors.push(format!("{}: {}", table, err));
            }
        }
    }

    if errors.is_empty() {
        Ok(Json(CleanupResponse {
            message: format!("Database cleaned up successfully, deleted {} tables", tables_deleted.len()),
            tables_deleted,
            timestamp,
        }))
    } else {
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to clean up database",
                "details": errors,
                "timestamp": timestamp,
            })),
        ))
    }
}

/// Demo members used by the seed endpoint
fn create_sample_members() -> Vec<Member> {
    vec![
        Member::new("a@a.com", "password1"),
        Member::new("b@b.com", "password2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_members_are_unpersisted() {
        let members = create_sample_members();

        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|member| member.id.is_none()));
    }
}
