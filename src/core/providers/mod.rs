//! Upstream provider profiles
//!
//! Each upstream is a [`ProviderProfile`]: a stateless strategy object that
//! knows how to reshape a canonical request for that upstream, where to send
//! it, and how to turn its answers (whole or streamed) back into canonical
//! form. The call site picks a profile once from the [`ProviderKind`] named
//! by the request and never branches on provider names again.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod provider_registry;
pub mod unified_provider;

pub use provider_registry::ProviderRegistry;
pub use unified_provider::ProviderError;

use crate::core::cost::UsageRecord;
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalRequest, CanonicalResponse, CanonicalStreamEvent};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Upstream families the gateway can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Google,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Anthropic, Self::OpenAI, Self::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "google" | "gemini" => Ok(Self::Google),
            other => Err(ProviderError::unknown_provider(other)),
        }
    }
}

/// Strategy object for one upstream
pub trait ProviderProfile: Send + Sync {
    /// Which upstream this profile serves
    fn kind(&self) -> ProviderKind;

    /// Provider-native request body
    fn build_request(&self, request: &CanonicalRequest) -> Result<Value, ProviderError>;

    /// Target URL; credentials that travel in the query string are added here
    fn build_url(&self, model: &str, streaming: bool, api_key: &str)
    -> Result<String, ProviderError>;

    /// Request headers, including header-borne credentials
    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, ProviderError>;

    /// Adjust a built body for a one-shot (non-streaming) call
    fn prepare_one_shot(&self, body: &mut Value) {
        if let Some(object) = body.as_object_mut() {
            object.insert("stream".to_string(), Value::Bool(false));
        }
    }

    /// Map a non-streaming upstream body to canonical shape
    fn translate_response(
        &self,
        body: Value,
        ids: &dyn ToolIdGenerator,
    ) -> Result<CanonicalResponse, ProviderError>;

    /// Map one parsed SSE payload to zero or more canonical events
    fn translate_chunk(
        &self,
        payload: Value,
        blocks: &mut BlockTracker,
        ids: &dyn ToolIdGenerator,
    ) -> Vec<CanonicalStreamEvent>;

    /// Token counts carried by a payload (zero where absent)
    fn extract_usage(&self, payload: &Value) -> UsageRecord;
}

/// JSON content-type header shared by every profile
pub(crate) fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    headers
}

/// Header value from a secret, rejecting control characters
pub(crate) fn secret_header(
    provider: ProviderKind,
    value: &str,
) -> Result<reqwest::header::HeaderValue, ProviderError> {
    let mut header = reqwest::header::HeaderValue::from_str(value).map_err(|_| {
        ProviderError::invalid_request(provider.as_str(), "API key is not a valid header value")
    })?;
    header.set_sensitive(true);
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider { .. }));
    }

    #[test]
    fn test_provider_kind_serde() {
        assert_eq!(
            serde_json::to_value(ProviderKind::OpenAI).unwrap(),
            serde_json::json!("openai")
        );
    }
}
