use serde::{Deserialize, Serialize};

/// A single cart line item: one product placed in one member's cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub member_id: i64,
    pub product_id: i64,
}

/// Response model for cart operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    pub id: i64,
    pub member_id: i64,
    pub product_id: i64,
}

impl Cart {
    /// Create a cart line item with a storage-assigned id
    pub fn new(id: i64, member_id: i64, product_id: i64) -> Self {
        Self {
            id,
            member_id,
            product_id,
        }
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            member_id: cart.member_id,
            product_id: cart.product_id,
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id,
            member_id: cart.member_id,
            product_id: cart.product_id,
        }
    }
}
