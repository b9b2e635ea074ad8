//! Google Gemini upstream

mod streaming;
mod transformer;

pub use transformer::{GeminiRequestTransformer, GeminiResponseTransformer};

use super::{ProviderError, ProviderKind, ProviderProfile, json_headers};
use crate::core::cost::{UsageRecord, token_field};
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalRequest, CanonicalResponse, CanonicalStreamEvent};
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini generateContent profile
#[derive(Debug, Clone)]
pub struct GeminiProfile {
    base_url: String,
}

impl Default for GeminiProfile {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GeminiProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ProviderProfile for GeminiProfile {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<Value, ProviderError> {
        Ok(GeminiRequestTransformer::transform(request))
    }

    /// The API key travels as the `key` query parameter
    fn build_url(
        &self,
        model: &str,
        streaming: bool,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let method = if streaming {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::invalid_request("google", format!("bad URL: {}", e)))?;
        // The model is one path segment; `/`, `?` and `#` in it are escaped
        url.path_segments_mut()
            .map_err(|_| ProviderError::invalid_request("google", "base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(["v1beta", "models"])
            .push(&format!("{}:{}", model, method));
        {
            let mut query = url.query_pairs_mut();
            if streaming {
                query.append_pair("alt", "sse");
            }
            query.append_pair("key", api_key);
        }
        Ok(url.into())
    }

    fn build_headers(&self, _api_key: &str) -> Result<HeaderMap, ProviderError> {
        Ok(json_headers())
    }

    /// The sync endpoint is selected by URL; the body has no stream flag
    fn prepare_one_shot(&self, _body: &mut Value) {}

    fn translate_response(
        &self,
        body: Value,
        ids: &dyn ToolIdGenerator,
    ) -> Result<CanonicalResponse, ProviderError> {
        GeminiResponseTransformer::transform(&body, ids)
    }

    fn translate_chunk(
        &self,
        payload: Value,
        blocks: &mut BlockTracker,
        ids: &dyn ToolIdGenerator,
    ) -> Vec<CanonicalStreamEvent> {
        streaming::translate_chunk(&payload, blocks, ids)
    }

    fn extract_usage(&self, payload: &Value) -> UsageRecord {
        let usage = payload.get("usageMetadata");
        UsageRecord::new(
            token_field(usage, "promptTokenCount"),
            token_field(usage, "candidatesTokenCount"),
        )
    }
}
