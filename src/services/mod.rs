// Services module - business logic layer

pub mod cart_service;
pub mod member_service;

pub use cart_service::CartService;
pub use member_service::{MemberLookup, MemberService};
