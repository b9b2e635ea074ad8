//! Anthropic upstream
//!
//! The canonical protocol is modeled on the Anthropic Messages API, so this
//! profile is close to a passthrough.

mod streaming;
mod transformer;

use super::{ProviderError, ProviderKind, ProviderProfile, json_headers, secret_header};
use crate::core::cost::UsageRecord;
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalRequest, CanonicalResponse, CanonicalStreamEvent};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API profile
#[derive(Debug, Clone)]
pub struct AnthropicProfile {
    base_url: String,
}

impl Default for AnthropicProfile {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AnthropicProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ProviderProfile for AnthropicProfile {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<Value, ProviderError> {
        transformer::build_request(request)
    }

    fn build_url(
        &self,
        _model: &str,
        _streaming: bool,
        _api_key: &str,
    ) -> Result<String, ProviderError> {
        Ok(format!("{}/v1/messages", self.base_url))
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = json_headers();
        headers.insert("x-api-key", secret_header(self.kind(), api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(DEFAULT_API_VERSION),
        );
        Ok(headers)
    }

    fn translate_response(
        &self,
        body: Value,
        _ids: &dyn ToolIdGenerator,
    ) -> Result<CanonicalResponse, ProviderError> {
        transformer::translate_response(body)
    }

    fn translate_chunk(
        &self,
        payload: Value,
        blocks: &mut BlockTracker,
        _ids: &dyn ToolIdGenerator,
    ) -> Vec<CanonicalStreamEvent> {
        streaming::translate_chunk(payload, blocks)
    }

    fn extract_usage(&self, payload: &Value) -> UsageRecord {
        transformer::extract_usage(payload)
    }
}
