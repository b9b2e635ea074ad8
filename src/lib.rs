//! # creditgate
//!
//! A metered gateway in front of hosted language-model APIs.
//!
//! Clients speak a single protocol (Anthropic Messages, with the same
//! content-block and SSE shapes) whichever upstream serves the call. Every
//! call is billed against a prepaid credit balance.
//!
//! ## Features
//!
//! - **One protocol**: requests and responses are translated to and from
//!   OpenAI Chat Completions and Gemini `generateContent`
//! - **Streaming**: upstream SSE is transcoded on the fly, preserving
//!   content-block order and tool-call argument fragments
//! - **Prepaid credits**: balance precheck, conditional deduction, audit log
//! - **Auto-recharge**: off-session card top-ups for pro accounts
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use creditgate::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod auth;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::billing::{CreditLedger, UserAccount};
pub use core::providers::{ProviderError, ProviderKind, ProviderProfile, ProviderRegistry};
pub use core::proxy::{ProxyReply, ProxyService};
pub use core::types::{BalanceMeta, CanonicalRequest, CanonicalResponse, CanonicalStreamEvent};

use tracing::info;

/// The gateway process: configuration plus the HTTP server built from it
pub struct Gateway {
    server: server::HttpServer,
}

impl Gateway {
    /// Connect storage and assemble the server
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");
        let server = server::HttpServer::new(config).await?;
        Ok(Self { server })
    }

    /// Run until the server stops
    pub async fn run(self) -> Result<()> {
        info!("Starting creditgate {}", VERSION);
        self.server.start().await
    }
}

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
