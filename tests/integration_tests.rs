use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use cart_rs::repositories::CartRepository;

mod common;
use common::*;

#[tokio::test]
async fn test_health_endpoint() {
    let test_env = TestEnvironment::new().await;

    let response = test_env
        .client
        .get(format!("{}/health/status", test_env.base_url))
        .send()
        .await
        .expect("Failed to call health endpoint");

    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse health body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "cart-rs");
}

#[tokio::test]
async fn test_list_members_in_insertion_order() {
    let test_env = TestEnvironment::new().await;

    let first_id = test_env.seed_member("a@a.com", "password1").await;
    let second_id = test_env.seed_member("b@b.com", "password2").await;

    let response = test_env
        .client
        .get(format!("{}/api/members", test_env.base_url))
        .send()
        .await
        .expect("Failed to list members");

    assert_eq!(response.status().as_u16(), 200);

    let members: Vec<Value> = response.json().await.expect("Failed to parse members");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["id"], first_id);
    assert_eq!(members[0]["email"], "a@a.com");
    assert_eq!(members[1]["id"], second_id);
    assert_eq!(members[1]["email"], "b@b.com");
}

#[tokio::test]
async fn test_complete_cart_journey() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.base_url;

    test_env.seed_member("a@a.com", "password1").await;
    let auth = TestEnvironment::basic_auth("a@a.com", "password1");

    // Step 1: the cart starts empty
    let response = client
        .get(format!("{}/api/carts", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to get cart");

    assert_eq!(response.status().as_u16(), 200);
    let carts: Vec<Value> = response.json().await.expect("Failed to parse cart");
    assert!(carts.is_empty());

    // Step 2: add two products
    let response = client
        .post(format!("{}/api/carts/3", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to add first product");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let first_cart_id = body["cart_id"].as_i64().expect("Expected cart_id");
    assert_eq!(first_cart_id, 1);

    let response = client
        .post(format!("{}/api/carts/5", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to add second product");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let second_cart_id = body["cart_id"].as_i64().expect("Expected cart_id");

    // Step 3: the cart lists both items in insertion order
    let response = client
        .get(format!("{}/api/carts", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to get cart");

    let carts: Vec<Value> = response.json().await.expect("Failed to parse cart");
    assert_eq!(carts.len(), 2);
    assert_eq!(carts[0]["id"], first_cart_id);
    assert_eq!(carts[0]["product_id"], 3);
    assert_eq!(carts[1]["id"], second_cart_id);
    assert_eq!(carts[1]["product_id"], 5);

    // Step 4: delete the first line item by cart id
    let response = client
        .delete(format!("{}/api/carts/{}", base_url, first_cart_id))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to delete cart item");

    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/carts", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to get cart");

    let carts: Vec<Value> = response.json().await.expect("Failed to parse cart");
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["id"], second_cart_id);

    // Step 5: delete the remaining product across all carts
    let response = client
        .delete(format!("{}/api/carts/products/5", base_url))
        .send()
        .await
        .expect("Failed to delete product from carts");

    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/carts", base_url))
        .header(AUTHORIZATION, auth.as_str())
        .send()
        .await
        .expect("Failed to get cart");

    let carts: Vec<Value> = response.json().await.expect("Failed to parse cart");
    assert!(carts.is_empty());
}

#[tokio::test]
async fn test_cart_requires_authentication() {
    let test_env = TestEnvironment::new().await;

    // No Authorization header
    let response = test_env
        .client
        .get(format!("{}/api/carts", test_env.base_url))
        .send()
        .await
        .expect("Failed to call cart endpoint");

    assert_eq!(response.status().as_u16(), 401);

    // Wrong password
    test_env.seed_member("a@a.com", "password1").await;
    let response = test_env
        .client
        .get(format!("{}/api/carts", test_env.base_url))
        .header(
            AUTHORIZATION,
            TestEnvironment::basic_auth("a@a.com", "wrong-password"),
        )
        .send()
        .await
        .expect("Failed to call cart endpoint");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_deleting_another_members_item_is_a_no_op() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.base_url;

    let owner_id = test_env.seed_member("a@a.com", "password1").await;
    test_env.seed_member("b@b.com", "password2").await;

    let owner_auth = TestEnvironment::basic_auth("a@a.com", "password1");
    let other_auth = TestEnvironment::basic_auth("b@b.com", "password2");

    // The owner puts a product in their cart
    let response = client
        .post(format!("{}/api/carts/3", base_url))
        .header(AUTHORIZATION, owner_auth.as_str())
        .send()
        .await
        .expect("Failed to add product");
    let body: Value = response.json().await.expect("Failed to parse response");
    let cart_id = body["cart_id"].as_i64().expect("Expected cart_id");

    // Another member attempts to delete that line item
    let response = client
        .delete(format!("{}/api/carts/{}", base_url, cart_id))
        .header(AUTHORIZATION, other_auth.as_str())
        .send()
        .await
        .expect("Failed to call delete");

    assert_eq!(response.status().as_u16(), 204);

    // The owner's cart is untouched
    let remaining = test_env
        .cart_repository
        .find_by_member_id(owner_id)
        .await
        .expect("Failed to read carts");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, cart_id);
}

#[tokio::test]
async fn test_product_deletion_spans_all_members() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.base_url;

    test_env.seed_member("a@a.com", "password1").await;
    test_env.seed_member("b@b.com", "password2").await;

    let first_auth = TestEnvironment::basic_auth("a@a.com", "password1");
    let second_auth = TestEnvironment::basic_auth("b@b.com", "password2");

    // Both members put the same product in their carts
    for auth in [&first_auth, &second_auth] {
        let response = client
            .post(format!("{}/api/carts/7", base_url))
            .header(AUTHORIZATION, auth.as_str())
            .send()
            .await
            .expect("Failed to add product");
        assert_eq!(response.status().as_u16(), 201);
    }

    // Deleting the product clears it from every cart
    let response = client
        .delete(format!("{}/api/carts/products/7", base_url))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(response.status().as_u16(), 204);

    for auth in [&first_auth, &second_auth] {
        let response = client
            .get(format!("{}/api/carts", base_url))
            .header(AUTHORIZATION, auth.as_str())
            .send()
            .await
            .expect("Failed to get cart");
        let carts: Vec<Value> = response.json().await.expect("Failed to parse cart");
        assert!(carts.is_empty());
    }
}
