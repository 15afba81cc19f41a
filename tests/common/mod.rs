use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::get, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use tokio::net::TcpListener;

use cart_rs::handlers::{create_cart_router, create_member_router, health_check};
use cart_rs::models::{Cart, Member, RepositoryError, RepositoryResult};
use cart_rs::observability::{BusinessTracingMiddleware, Metrics};
use cart_rs::repositories::{CartRepository, MemberRepository};
use cart_rs::services::{CartService, MemberService};

/// In-memory cart repository backing the integration tests
#[derive(Clone, Default)]
pub struct InMemoryCartRepository {
    carts: Arc<Mutex<Vec<Cart>>>,
    next_id: Arc<Mutex<i64>>,
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_member_id(&self, member_id: i64) -> RepositoryResult<Vec<Cart>> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .iter()
            .filter(|cart| cart.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn save(&self, member_id: i64, product_id: i64) -> RepositoryResult<i64> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let cart_id = *next_id;

        self.carts
            .lock()
            .unwrap()
            .push(Cart::new(cart_id, member_id, product_id));

        Ok(cart_id)
    }

    async fn delete_by_cart_id_and_member_id(
        &self,
        cart_id: i64,
        member_id: i64,
    ) -> RepositoryResult<()> {
        self.carts
            .lock()
            .unwrap()
            .retain(|cart| !(cart.id == cart_id && cart.member_id == member_id));
        Ok(())
    }

    async fn delete_by_product_id(&self, product_id: i64) -> RepositoryResult<()> {
        self.carts
            .lock()
            .unwrap()
            .retain(|cart| cart.product_id != product_id);
        Ok(())
    }
}

/// In-memory member repository backing the integration tests
#[derive(Clone, Default)]
pub struct InMemoryMemberRepository {
    members: Arc<Mutex<Vec<Member>>>,
    next_id: Arc<Mutex<i64>>,
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        Ok(self.members.lock().unwrap().clone())
    }

    async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> RepositoryResult<Member> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.email == email && member.password == password)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn save(&self, member: Member) -> RepositoryResult<Member> {
        let member = match member.id {
            Some(_) => member,
            None => {
                let mut next_id = self.next_id.lock().unwrap();
                *next_id += 1;
                Member::with_id(*next_id, member.email, member.password)
            }
        };

        self.members.lock().unwrap().push(member.clone());
        Ok(member)
    }
}

/// A running instance of the real application router wired to in-memory
/// repositories
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub member_repository: InMemoryMemberRepository,
    pub cart_repository: InMemoryCartRepository,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let member_repository = InMemoryMemberRepository::default();
        let cart_repository = InMemoryCartRepository::default();

        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let tracing = Arc::new(BusinessTracingMiddleware::new(metrics));

        let member_service = Arc::new(MemberService::new(Arc::new(member_repository.clone())));
        let cart_service = Arc::new(CartService::new(
            Arc::new(cart_repository.clone()),
            member_service.clone(),
        ));

        let app = Router::new()
            .route("/health/status", get(health_check))
            .merge(create_member_router(member_service.clone(), tracing.clone()))
            .merge(create_cart_router(cart_service, member_service, tracing));

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            member_repository,
            cart_repository,
        }
    }

    /// Insert a member directly into storage, returning its assigned id
    pub async fn seed_member(&self, email: &str, password: &str) -> i64 {
        let member = self
            .member_repository
            .save(Member::new(email, password))
            .await
            .expect("Failed to seed member");
        member.id.expect("Seeded member has no id")
    }

    /// Build an HTTP Basic Authorization header value
    pub fn basic_auth(email: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", email, password)))
    }
}
