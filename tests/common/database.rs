//! Test database utilities
//!
//! Each test gets an isolated in-memory SQLite database with the schema
//! migrated.

use creditgate::config::DatabaseConfig;
use creditgate::core::billing::UserAccount;
use creditgate::storage::StorageLayer;
use creditgate::storage::database::Database;
use std::sync::Arc;
use uuid::Uuid;

/// Test database wrapper providing isolated in-memory SQLite instances
#[derive(Debug, Clone)]
pub struct TestDatabase {
    inner: Arc<Database>,
}

impl TestDatabase {
    /// Create a new in-memory test database
    pub async fn new() -> Self {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            // Every connection to :memory: is its own database
            max_connections: 1,
            connection_timeout: 5,
            run_migrations: true,
        };

        let db = Database::new(&config)
            .await
            .expect("Failed to create in-memory test database");
        db.migrate()
            .await
            .expect("Failed to run database migrations");

        Self {
            inner: Arc::new(db),
        }
    }

    /// Get reference to the underlying database
    pub fn db(&self) -> &Database {
        &self.inner
    }

    /// Get Arc to the underlying database
    pub fn db_arc(&self) -> Arc<Database> {
        Arc::clone(&self.inner)
    }

    /// Storage layer sharing this database
    pub fn storage(&self) -> StorageLayer {
        StorageLayer {
            database: self.db_arc(),
        }
    }

    /// Insert an account and return it
    pub async fn insert(&self, account: UserAccount) -> UserAccount {
        self.inner
            .create_user(&account)
            .await
            .expect("Failed to insert test account")
    }

    /// Current balance of an account
    pub async fn credits(&self, user_id: Uuid) -> i64 {
        self.inner
            .get_credits(user_id)
            .await
            .expect("Failed to read balance")
            .expect("Account missing")
    }
}
