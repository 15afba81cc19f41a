use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, Instrument};

use crate::models::{Cart, RepositoryError, RepositoryResult};

/// Reserved key of the id counter item. It carries no member_id or
/// product_id attributes, so it never appears in either GSI.
const COUNTER_CART_ID: i64 = 0;

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find all cart line items belonging to a member, ordered by cart id
    async fn find_by_member_id(&self, member_id: i64) -> RepositoryResult<Vec<Cart>>;

    /// Persist a new line item and return its storage-assigned id
    async fn save(&self, member_id: i64, product_id: i64) -> RepositoryResult<i64>;

    /// Delete the line item matching both ids; a no-op when nothing matches
    async fn delete_by_cart_id_and_member_id(
        &self,
        cart_id: i64,
        member_id: i64,
    ) -> RepositoryResult<()>;

    /// Delete every line item referencing the product, across all members
    async fn delete_by_product_id(&self, product_id: i64) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    /// Create a new DynamoDB cart repository
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

    /// Convert a Cart struct to DynamoDB attribute values
    pub fn cart_to_item(&self, cart: &Cart) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "cart_id".to_string(),
            AttributeValue::N(cart.id.to_string()),
        );
        item.insert(
            "member_id".to_string(),
            AttributeValue::N(cart.member_id.to_string()),
        );
        item.insert(
            "product_id".to_string(),
            AttributeValue::N(cart.product_id.to_string()),
        );

        item
    }

    /// Convert DynamoDB item to Cart struct
    pub fn item_to_cart(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Cart> {
        let id = Self::get_number(&item, "cart_id")?;
        let member_id = Self::get_number(&item, "member_id")?;
        let product_id = Self::get_number(&item, "product_id")?;

        Ok(Cart {
            id,
            member_id,
            product_id,
        })
    }

    fn get_number(item: &HashMap<String, AttributeValue>, name: &str) -> RepositoryResult<i64> {
        item.get(name)
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: format!("Missing or invalid {}", name),
            })
    }

    /// Allocate the next cart id from the atomic counter item
    async fn next_cart_id(&self) -> RepositoryResult<i64> {
        let update_span = self.create_dynamodb_span("UpdateItem");

        let response = async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("cart_id", AttributeValue::N(COUNTER_CART_ID.to_string()))
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
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id))]
    async fn find_by_member_id(&self, member_id: i64) -> RepositoryResult<Vec<Cart>> {
        info!("Finding cart items for member");

        let query_span = self.create_dynamodb_span("Query");

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name("MemberIdIndex")
                .key_condition_expression("member_id = :member_id")
                .expression_attribute_values(
                    ":member_id",
                    AttributeValue::N(member_id.to_string()),
                )
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        // The index range key is cart_id, so items come back in id order,
        // which is insertion order because ids are allocated monotonically.
        let mut carts = Vec::new();
        for item in response.items.unwrap_or_default() {
            carts.push(self.item_to_cart(item)?);
        }

        info!("Found {} cart items", carts.len());
        Ok(carts)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, product_id = %product_id))]
    async fn save(&self, member_id: i64, product_id: i64) -> RepositoryResult<i64> {
        info!("Saving cart item");

        let cart_id = self.next_cart_id().await?;
        let cart = Cart::new(cart_id, member_id, product_id);
        let item = self.cart_to_item(&cart);

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

        info!("Cart item saved with id {}", cart_id);
        Ok(cart_id)
    }

    #[instrument(skip(self), fields(table = %self.table_name, cart_id = %cart_id, member_id = %member_id))]
    async fn delete_by_cart_id_and_member_id(
        &self,
        cart_id: i64,
        member_id: i64,
    ) -> RepositoryResult<()> {
        info!("Deleting cart item by cart id and member id");

        let delete_span = self.create_dynamodb_span("DeleteItem");

        async {
            let result = self
                .client
                .delete_item()
                .table_name(&self.table_name)
                .key("cart_id", AttributeValue::N(cart_id.to_string()))
                .condition_expression("member_id = :member_id")
                .expression_attribute_values(
                    ":member_id",
                    AttributeValue::N(member_id.to_string()),
                )
                .send()
                .await;

            match result {
                Ok(_) => {
                    info!("Cart item deleted");
                    Ok(())
                }
                Err(err) => {
                    let service_err = err.into_service_error();
                    if service_err.is_conditional_check_failed_exception() {
                        // No row matched both ids; the deletion is a no-op.
                        info!("No cart item matched both ids");
                        Ok(())
                    } else {
                        Err(self.map_dynamodb_error(service_err.into()))
                    }
                }
            }
        }
        .instrument(delete_span)
        .await
    }

    #[instrument(skip(self), fields(table = %self.table_name, product_id = %product_id))]
    async fn delete_by_product_id(&self, product_id: i64) -> RepositoryResult<()> {
        info!("Deleting cart items by product id");

        let query_span = self.create_dynamodb_span("Query");

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name("ProductIdIndex")
                .key_condition_expression("product_id = :product_id")
                .expression_attribute_values(
                    ":product_id",
                    AttributeValue::N(product_id.to_string()),
                )
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let items = response.items.unwrap_or_default();
        info!("Deleting {} cart items", items.len());

        for item in items {
            let cart_id = Self::get_number(&item, "cart_id")?;
            let delete_span = self.create_dynamodb_span("DeleteItem");

            async {
                self.client
                    .delete_item()
                    .table_name(&self.table_name)
                    .key("cart_id", AttributeValue::N(cart_id.to_string()))
                    .send()
                    .await
                    .map_err(|e| self.map_dynamodb_error(e.into()))
            }
            .instrument(delete_span)
            .await?;
        }

        info!("Cart items deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_repository() -> DynamoDbCartRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        DynamoDbCartRepository::new(client, "test-carts".to_string(), "us-east-1".to_string())
    }

    #[test]
    fn test_cart_to_item_conversion() {
        let repo = create_test_repository();
        let cart = Cart::new(1, 2, 3);

        let item = repo.cart_to_item(&cart);

        assert_eq!(item.get("cart_id"), Some(&AttributeValue::N("1".to_string())));
        assert_eq!(
            item.get("member_id"),
            Some(&AttributeValue::N("2".to_string()))
        );
        assert_eq!(
            item.get("product_id"),
            Some(&AttributeValue::N("3".to_string()))
        );
    }

    #[test]
    fn test_item_to_cart_conversion() {
        let repo = create_test_repository();
        let cart = Cart::new(4, 2, 3);

        let item = repo.cart_to_item(&cart);
        let converted = repo.item_to_cart(item).unwrap();

        assert_eq!(converted, cart);
    }

    #[test]
    fn test_item_to_cart_missing_field() {
        let repo = create_test_repository();

        let mut item = HashMap::new();
        item.insert("cart_id".to_string(), AttributeValue::N("1".to_string()));
        // member_id and product_id missing

        let result = repo.item_to_cart(item);
        assert!(result.is_err());

        match result.unwrap_err() {
            RepositoryError::InvalidItem { message } => {
                assert!(message.contains("member_id"));
            }
            _ => panic!("Expected InvalidItem error"),
        }
    }

    #[test]
    fn test_item_to_cart_non_numeric_field() {
        let repo = create_test_repository();

        let mut item = HashMap::new();
        item.insert("cart_id".to_string(), AttributeValue::N("1".to_string()));
        item.insert(
            "member_id".to_string(),
            AttributeValue::S("not-a-number".to_string()),
        );
        item.insert("product_id".to_string(), AttributeValue::N("3".to_string()));

        assert!(repo.item_to_cart(item).is_err());
    }

    #[test]
    fn test_repository_creation() {
        let repo = create_test_repository();
        assert_eq!(repo.table_name(), "test-carts");
    }

    // Note: Integration tests with actual DynamoDB would live in a separate
    // test file against a local DynamoDB instance
}
