/// Audit row entity module
pub mod api_call;
/// User entity module
pub mod user;

pub use api_call::Entity as ApiCall;
pub use user::Entity as User;
