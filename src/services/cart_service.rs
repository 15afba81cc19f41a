use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{CartResponse, MemberRequest, RepositoryError, ServiceResult};
use crate::repositories::CartRepository;
use crate::services::MemberLookup;

/// Service for managing a member's cart line items
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    member_service: Arc<dyn MemberLookup>,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        member_service: Arc<dyn MemberLookup>,
    ) -> Self {
        Self {
            cart_repository,
            member_service,
        }
    }

    /// Add a product to the member's cart and return the new line item id.
    ///
    /// The member's existing cart state is fetched before the save; callers
    /// may rely on that lookup-then-save ordering. Duplicate (member,
    /// product) line items are allowed.
    #[instrument(skip(self, member_request), fields(member_id = %member_request.member_id, product_id = %product_id))]
    pub async fn add_cart(
        &self,
        product_id: i64,
        member_request: &MemberRequest,
    ) -> ServiceResult<i64> {
        info!("Adding product to cart");

        // The lookup precedes the save as part of the contract, even though
        // its result does not gate the save.
        self.cart_repository
            .find_by_member_id(member_request.member_id)
            .await?;

        let cart_id = self
            .cart_repository
            .save(member_request.member_id, product_id)
            .await?;

        info!("Cart item created with id {}", cart_id);
        Ok(cart_id)
    }

    /// List the cart line items of the member identified by the request's
    /// credentials.
    ///
    /// Authentication runs first and the lookup uses the RESOLVED member id;
    /// the id embedded in the request is never trusted. A failed credential
    /// match propagates unchanged.
    #[instrument(skip(self, member_request), fields(email = %member_request.email))]
    pub async fn find_by_member_request(
        &self,
        member_request: &MemberRequest,
    ) -> ServiceResult<Vec<CartResponse>> {
        info!("Listing cart items for member");

        let member = self
            .member_service
            .find_by_email_and_password(&member_request.email, &member_request.password)
            .await?;

        let member_id = member.id.ok_or(RepositoryError::InvalidItem {
            message: "Authenticated member has no id".to_string(),
        })?;

        let carts = self.cart_repository.find_by_member_id(member_id).await?;

        info!("Found {} cart items", carts.len());
        Ok(carts.iter().map(CartResponse::from).collect())
    }

    /// Delete the line item matching both ids. Exactly one storage
    /// interaction; ownership enforcement lives in that single call.
    #[instrument(skip(self))]
    pub async fn delete_by_cart_id_and_member_id(
        &self,
        cart_id: i64,
        member_id: i64,
    ) -> ServiceResult<()> {
        info!("Deleting cart item");

        self.cart_repository
            .delete_by_cart_id_and_member_id(cart_id, member_id)
            .await?;

        info!("Cart item deleted");
        Ok(())
    }

    /// Delete every line item referencing the product, across all members.
    /// Exactly one storage interaction.
    #[instrument(skip(self))]
    pub async fn delete_by_product_id(&self, product_id: i64) -> ServiceResult<()> {
        info!("Deleting cart items for product");

        self.cart_repository.delete_by_product_id(product_id).await?;

        info!("Cart items deleted");
        Ok(())
    }
}
