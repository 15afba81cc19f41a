use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::models::{RepositoryError, RepositoryResult};

/// Manages DynamoDB table creation and configuration
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create the members table with its email GSI
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_members_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating members table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = vec![
            Self::attribute("id", ScalarAttributeType::N)?,
            Self::attribute("email", ScalarAttributeType::S)?,
        ];

        let key_schema = vec![Self::key_element("id", KeyType::Hash)?];

        let email_gsi = GlobalSecondaryIndex::builder()
            .index_name("EmailIndex")
            .key_schema(Self::key_element("email", KeyType::Hash)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build GSI: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .global_secondary_indexes(email_gsi)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Members table created successfully");

        Ok(())
    }

    /// Create the carts table with member and product GSIs
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_carts_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating carts table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = vec![
            Self::attribute("cart_id", ScalarAttributeType::N)?,
            Self::attribute("member_id", ScalarAttributeType::N)?,
            Self::attribute("product_id", ScalarAttributeType::N)?,
        ];

        let key_schema = vec![Self::key_element("cart_id", KeyType::Hash)?];

        // cart_id as the range key keeps query results in id order, which is
        // insertion order because ids are allocated monotonically.
        let member_gsi = GlobalSecondaryIndex::builder()
            .index_name("MemberIdIndex")
            .key_schema(Self::key_element("member_id", KeyType::Hash)?)
            .key_schema(Self::key_element("cart_id", KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build GSI: {}", e),
            })?;

        let product_gsi = GlobalSecondaryIndex::builder()
            .index_name("ProductIdIndex")
            .key_schema(Self::key_element("product_id", KeyType::Hash)?)
            .key_schema(Self::key_element("cart_id", KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build GSI: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .global_secondary_indexes(member_gsi)
            .global_secondary_indexes(product_gsi)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Carts table created successfully");

        Ok(())
    }

    /// Create both tables (convenience method)
    #[instrument(skip(self))]
    pub async fn create_all_tables(
        &self,
        members_table: &str,
        carts_table: &str,
    ) -> RepositoryResult<()> {
        info!("Creating all tables");

        let members_future = self.create_members_table(members_table);
        let carts_future = self.create_carts_table(carts_table);

        let (members_result, carts_result) = tokio::join!(members_future, carts_future);

        members_result?;
        carts_result?;

        info!("All tables created successfully");
        Ok(())
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_string = e.to_string();
                let error_debug = format!("{:?}", e);

                if error_string.contains("ResourceNotFoundException")
                    || error_string.contains("Requested resource not found")
                    || error_debug.contains("ResourceNotFoundException")
                {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    /// Delete a table (for testing/cleanup)
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn delete_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Deleting table");

        if !self.table_exists(table_name).await? {
            info!("Table {} does not exist, nothing to delete", table_name);
            return Ok(());
        }

        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table {} deletion initiated", table_name);
        Ok(())
    }

    /// Wait for a table to become active
    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;
        let max_attempts = 30;
        let wait_duration = Duration::from_secs(10);

        loop {
            match self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
            {
                Ok(response) => {
                    if let Some(table) = response.table {
                        match table.table_status {
                            Some(TableStatus::Active) => {
                                info!("Table {} is now active", table_name);
                                return Ok(());
                            }
                            Some(status) => {
                                info!("Table {} status: {:?}, waiting...", table_name, status);
                            }
                            None => {
                                warn!("Table {} status unknown, waiting...", table_name);
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Error checking table status: {}", e);
                    return Err(self.map_dynamodb_error(e.into()));
                }
            }

            attempts += 1;
            if attempts >= max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Timeout);
            }

            tokio::time::sleep(wait_duration).await;
        }
    }

    fn attribute(
        name: &str,
        attribute_type: ScalarAttributeType,
    ) -> RepositoryResult<AttributeDefinition> {
        AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(attribute_type)
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build attribute definition: {}", e),
            })
    }

    fn key_element(name: &str, key_type: KeyType) -> RepositoryResult<KeySchemaElement> {
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build key schema: {}", e),
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
