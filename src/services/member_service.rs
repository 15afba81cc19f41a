use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{MemberResponse, ServiceResult};
use crate::repositories::MemberRepository;

/// Credential-based member resolution, consumed by `CartService`
#[async_trait]
pub trait MemberLookup: Send + Sync {
    /// Resolve the member whose email and password both match exactly.
    /// A missing match surfaces the storage collaborator's not-found error
    /// unchanged.
    async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<MemberResponse>;
}

/// Service exposing read-only member queries
pub struct MemberService {
    member_repository: Arc<dyn MemberRepository>,
}

impl MemberService {
    /// Create a new MemberService
    pub fn new(member_repository: Arc<dyn MemberRepository>) -> Self {
        Self { member_repository }
    }

    /// List every member, one projection per stored record, in storage order
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> ServiceResult<Vec<MemberResponse>> {
        info!("Listing all members");

        let members = self.member_repository.find_all().await?;

        info!("Found {} members", members.len());
        Ok(members.iter().map(MemberResponse::from).collect())
    }

    /// Resolve a member by credentials, projected for transport
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<MemberResponse> {
        info!("Resolving member by credentials");

        let member = self
            .member_repository
            .find_by_email_and_password(email, password)
            .await?;

        Ok(MemberResponse::from(member))
    }
}

#[async_trait]
impl MemberLookup for MemberService {
    async fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<MemberResponse> {
        MemberService::find_by_email_and_password(self, email, password).await
    }
}
