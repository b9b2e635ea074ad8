//! HTTP server
//!
//! Routing, shared state and server startup.

pub mod builder;
pub mod routes;
pub mod server;
pub mod state;

pub use server::HttpServer;
pub use state::AppState;
