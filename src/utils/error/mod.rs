//! Error handling
//!
//! Gateway-wide error type, its HTTP mapping and construction helpers.

mod helpers;
mod response;
mod types;

pub use response::{ErrorDetail, ErrorResponse};
pub use types::{GatewayError, Result};
