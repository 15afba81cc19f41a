// Repositories module - data access layer

pub mod cart_repository;
pub mod member_repository;
pub mod table_manager;

pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use member_repository::{DynamoDbMemberRepository, MemberRepository};
pub use table_manager::TableManager;
