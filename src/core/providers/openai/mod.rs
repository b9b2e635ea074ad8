//! OpenAI Responses API upstream

mod streaming;
mod transformer;

pub use transformer::{OpenAIRequestTransformer, OpenAIResponseTransformer};

use super::{ProviderError, ProviderKind, ProviderProfile, json_headers, secret_header};
use crate::core::cost::{UsageRecord, token_field};
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalRequest, CanonicalResponse, CanonicalStreamEvent};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::{Value, json};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Reasoning effort applied to one-shot calls that did not ask for one
pub const ONE_SHOT_REASONING_EFFORT: &str = "low";

/// OpenAI Responses API profile
#[derive(Debug, Clone)]
pub struct OpenAIProfile {
    base_url: String,
}

impl Default for OpenAIProfile {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OpenAIProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ProviderProfile for OpenAIProfile {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<Value, ProviderError> {
        Ok(OpenAIRequestTransformer::transform(request))
    }

    fn build_url(
        &self,
        _model: &str,
        _streaming: bool,
        _api_key: &str,
    ) -> Result<String, ProviderError> {
        Ok(format!("{}/v1/responses", self.base_url))
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = json_headers();
        headers.insert(
            AUTHORIZATION,
            secret_header(self.kind(), &format!("Bearer {}", api_key))?,
        );
        Ok(headers)
    }

    fn prepare_one_shot(&self, body: &mut Value) {
        if let Some(object) = body.as_object_mut() {
            object.insert("stream".to_string(), Value::Bool(false));
            object
                .entry("reasoning")
                .or_insert_with(|| json!({ "effort": ONE_SHOT_REASONING_EFFORT }));
        }
    }

    fn translate_response(
        &self,
        body: Value,
        _ids: &dyn ToolIdGenerator,
    ) -> Result<CanonicalResponse, ProviderError> {
        OpenAIResponseTransformer::transform(body)
    }

    fn translate_chunk(
        &self,
        payload: Value,
        blocks: &mut BlockTracker,
        ids: &dyn ToolIdGenerator,
    ) -> Vec<CanonicalStreamEvent> {
        streaming::translate_chunk(&payload, blocks, ids)
    }

    /// Usage is top-level on one-shot bodies and under `response` on
    /// terminal stream events. Cached input is not broken out.
    fn extract_usage(&self, payload: &Value) -> UsageRecord {
        let usage = payload
            .get("usage")
            .or_else(|| payload.get("response").and_then(|r| r.get("usage")));
        UsageRecord::new(
            token_field(usage, "input_tokens"),
            token_field(usage, "output_tokens"),
        )
    }
}
