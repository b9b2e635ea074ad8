//! Storage layer for the Gateway
//!
//! This module provides data persistence for accounts and call history.

/// Database storage module
pub mod database;

use crate::config::StorageConfig;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Main storage layer
#[derive(Debug, Clone)]
pub struct StorageLayer {
    /// Database connection pool
    pub database: Arc<database::Database>,
}

impl StorageLayer {
    /// Connect and, when configured, bring the schema up to date
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        info!("Initializing storage layer");

        debug!("Connecting to database");
        let database = database::Database::new(&config.database).await?;
        if config.database.run_migrations {
            database.migrate().await?;
        }

        info!("Storage layer initialized successfully");
        Ok(Self {
            database: Arc::new(database),
        })
    }

    /// Wrap an existing database handle
    pub fn from_database(database: database::Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    /// Get database connection
    pub fn db(&self) -> &database::Database {
        &self.database
    }

    /// Health check for all storage backends
    pub async fn health_check(&self) -> Result<()> {
        self.database.health_check().await
    }
}
