pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod member;
pub mod metrics;
pub mod middleware;

pub use admin::*;
pub use auth::*;
pub use cart::*;
pub use health::*;
pub use member::*;
pub use metrics::*;
pub use middleware::*;
