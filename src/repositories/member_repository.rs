use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, Instrument};

use crate::models::{Member, RepositoryError, RepositoryResult};

/// Reserved key of the id counter item, excluded from all reads.
const COUNTER_MEMBER_ID: i64 = 0;

/// Trait defining the interface for member data access operations
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find all members in insertion order
    async fn find_all(&self) -> RepositoryResult<Vec<Member>>;

    /// Find the member whose email and password both match exactly.
    /// Errors with `RepositoryError::NotFound` when no member matches.
    async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> RepositoryResult<Member>;

    /// Persist a member, assigning an id when absent. Used by the admin
    /// seeding path; member registration is not a service-layer concern.
    async fn save(&self, member: Member) -> RepositoryResult<Member>;
}

/// DynamoDB implementation of the MemberRepository trait
pub struct DynamoDbMemberRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbMemberRepository {
    /// Create a new DynamoDB member repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Create a DynamoDB subsegment span with proper X-Ray attributes
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
            "component" = "aws-sdk-dynamodb",
        )
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a Member struct to DynamoDB attribute values
    pub fn member_to_item(&self, member: &Member) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        if let Some(id) = member.id {
            item.insert("id".to_string(), AttributeValue::N(id.to_string()));
        }
        item.insert(
            "email".to_string(),
            AttributeValue::S(member.email.clone()),
        );
        item.insert(
            "password".to_string(),
            AttributeValue::S(member.password.clone()),
        );

        item
    }

    /// Convert DynamoDB item to Member struct
    pub fn item_to_member(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Member> {
        let id = item
            .get("id")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing or invalid id".to_string(),
            })?;

        let email = item
            .get("email")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing email".to_string(),
            })?
            .clone();

        let password = item
            .get("password")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing password".to_string(),
            })?
            .clone();

        Ok(Member::with_id(id, email, password))
    }

    /// Allocate the next member id from the atomic counter item
    async fn next_member_id(&self) -> RepositoryResult<i64> {
        let update_span = self.create_dynamodb_span("UpdateItem");

        let response = async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::N(COUNTER_MEMBER_ID.to_string()))
                .update_expression("ADD next_id :one")
                .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
                .return_values(ReturnValue::UpdatedNew)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(update_span)
        .await?;

        response
            .attributes()
            .and_then(|attrs| attrs.get("next_id"))
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Counter item returned no next_id".to_string(),
            })
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl MemberRepository for DynamoDbMemberRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        info!("Finding all members");

        let scan_span = self.create_dynamodb_span("Scan");

        let response = async {
            self.client
                .scan()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut members = Vec::new();
        for item in response.items.unwrap_or_default() {
            // Skip the counter item; it carries no member attributes.
            let is_counter = item
                .get("id")
                .and_then(|v| v.as_n().ok())
                .and_then(|s| s.parse::<i64>().ok())
                == Some(COUNTER_MEMBER_ID);
            if is_counter {
                continue;
            }
            members.push(self.item_to_member(item)?);
        }

        // Scan order is undefined; ids are allocated monotonically, so id
        // order is insertion order.
        members.sort_by_key(|member| member.id);

        info!("Found {} members", members.len());
        Ok(members)
    }

    #[instrument(skip(self, password), fields(table = %self.table_name, email = %email))]
    async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> RepositoryResult<Member> {
        info!("Finding member by credentials");

        let query_span = self.create_dynamodb_span("Query");

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name("EmailIndex")
                .key_condition_expression("email = :email")
                .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        for item in response.items.unwrap_or_default() {
            let member = self.item_to_member(item)?;
            // Exact, case-sensitive comparison on both credentials.
            if member.password == password {
                info!("Member found");
                return Ok(member);
            }
        }

        info!("No member matched the credentials");
        Err(RepositoryError::NotFound)
    }

    #[instrument(skip(self, member), fields(table = %self.table_name, email = %member.email))]
    async fn save(&self, member: Member) -> RepositoryResult<Member> {
        info!("Saving member");

        let member = match member.id {
            Some(_) => member,
            None => {
                let id = self.next_member_id().await?;
                Member::with_id(id, member.email, member.password)
            }
        };

        let item = self.member_to_item(&member);
        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Member saved");
        Ok(member)
    }
}
