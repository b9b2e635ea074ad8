//! Application state shared across HTTP handlers

use crate::auth::AuthGateway;
use crate::config::Config;
use crate::core::billing::{
    AccountStore, AuditSink, CreditLedger, DisabledRecharger, Recharger, StripeRecharger,
};
use crate::core::cost::PricingTable;
use crate::core::ids::{SharedToolIds, default_tool_ids};
use crate::core::providers::ProviderRegistry;
use crate::core::proxy::ProxyService;
use crate::core::rate_limiter::RateLimiter;
use crate::storage::StorageLayer;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// HTTP server state shared across handlers
///
/// Every field is cheap to clone; handlers receive it as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Bearer token verification and account lookup
    pub auth: Arc<AuthGateway>,
    /// Configured upstreams
    pub providers: Arc<ProviderRegistry>,
    /// Storage layer
    pub storage: Arc<StorageLayer>,
    /// Credit precheck, settlement and recharge
    pub ledger: CreditLedger,
    /// Metered call orchestration
    pub proxy: ProxyService,
    /// Per-account request limiter for the proxy route
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Assemble state from configuration and a connected storage layer
    pub fn new(config: Config, storage: StorageLayer) -> Result<Self> {
        let recharger = recharger_from_config(&config)?;
        Self::with_parts(config, storage, recharger, default_tool_ids())
    }

    /// Assemble state with an explicit card charger and tool-id source
    pub fn with_parts(
        config: Config,
        storage: StorageLayer,
        recharger: Arc<dyn Recharger>,
        ids: SharedToolIds,
    ) -> Result<Self> {
        let billing = config.billing();
        let pricing = PricingTable::new(billing.surcharge_multiplier)
            .and_then(|table| table.with_overrides(billing.pricing.clone()))
            .map_err(|e| GatewayError::Config(format!("Invalid pricing: {}", e)))?;

        let database = storage.database.clone();
        let store: Arc<dyn AccountStore> = database.clone();
        let audit: Arc<dyn AuditSink> = database;

        let ledger = CreditLedger::new(store.clone(), audit, recharger, Arc::new(pricing));
        let providers = Arc::new(ProviderRegistry::from_config(config.providers()));
        if providers.is_empty() {
            warn!("No upstream providers configured; every proxied call will fail");
        } else {
            info!(providers = ?providers.configured(), "Upstream providers registered");
        }

        let proxy = ProxyService::new(providers.clone(), ledger.clone(), ids)?;
        let auth = AuthGateway::new(config.auth(), store);
        let rate_limiter = RateLimiter::new(config.gateway.rate_limit.clone());

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            providers,
            storage: Arc::new(storage),
            ledger,
            proxy,
            rate_limiter,
        })
    }
}

fn recharger_from_config(config: &Config) -> Result<Arc<dyn Recharger>> {
    let recharge = &config.billing().recharge;
    match recharge.stripe_secret_key.as_deref() {
        Some(secret) if recharge.is_enabled() => {
            let recharger = StripeRecharger::new(secret, recharge)
                .map_err(|e| GatewayError::Config(format!("Invalid recharge settings: {}", e)))?;
            info!("Stripe auto-recharge enabled");
            Ok(Arc::new(recharger))
        }
        _ => {
            info!("Auto-recharge disabled: no payment secret configured");
            Ok(Arc::new(DisabledRecharger))
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("providers", &self.providers)
            .field("storage", &self.storage)
            .field("ledger", &self.ledger)
            .finish()
    }
}
