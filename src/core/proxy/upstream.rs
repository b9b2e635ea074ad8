//! HTTP client per upstream family

use crate::core::providers::{ProviderError, ProviderKind, ProviderRegistry};
use crate::utils::error::{GatewayError, Result};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
struct UpstreamEntry {
    client: reqwest::Client,
    timeout: Duration,
}

/// Pooled clients carrying each upstream's connect timeout
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    entries: HashMap<ProviderKind, UpstreamEntry>,
}

impl UpstreamClient {
    pub fn new(registry: &ProviderRegistry) -> Result<Self> {
        let mut entries = HashMap::new();
        for kind in ProviderKind::ALL {
            let Some(provider) = registry.get(kind) else {
                continue;
            };
            let client = reqwest::Client::builder()
                .connect_timeout(provider.connect_timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .map_err(GatewayError::HttpClient)?;
            entries.insert(
                kind,
                UpstreamEntry {
                    client,
                    timeout: provider.timeout,
                },
            );
        }
        Ok(Self { entries })
    }

    /// POST a JSON body upstream.
    ///
    /// One-shot calls are bounded by the upstream timeout; streaming calls
    /// only by the connect timeout.
    pub async fn post_json(
        &self,
        kind: ProviderKind,
        url: &str,
        headers: HeaderMap,
        body: &Value,
        streaming: bool,
    ) -> std::result::Result<reqwest::Response, ProviderError> {
        let entry = self
            .entries
            .get(&kind)
            .ok_or_else(|| ProviderError::network(kind.as_str(), "no client for upstream"))?;

        let mut request = entry.client.post(url).headers(headers).json(body);
        if !streaming {
            request = request.timeout(entry.timeout);
        }

        debug!(provider = %kind, streaming, "Sending upstream request");
        request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(kind.as_str(), &e))
    }
}
