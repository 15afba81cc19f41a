// Re-export all model types
pub use self::cart::*;
pub use self::errors::*;
pub use self::member::*;

mod cart;
mod errors;
mod member;
