//! JWT token handling
//!
//! HS256 bearer tokens whose `sub` claim is the account id.

mod handler;
pub mod types;


pub use types::{Claims, JwtHandler};
