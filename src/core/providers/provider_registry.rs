//! Provider Registry
//!
//! One profile per upstream family, each paired with the credentials and
//! timeouts from configuration. Every family always has a profile; only
//! the API key can be missing.

use super::anthropic::AnthropicProfile;
use super::gemini::GeminiProfile;
use super::openai::OpenAIProfile;
use super::{ProviderKind, ProviderProfile};
use crate::config::ProviderConfig;
use crate::config::models::{default_connect_timeout, default_upstream_timeout};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Profile plus per-upstream settings
#[derive(Clone)]
pub struct ProviderEntry {
    pub profile: Arc<dyn ProviderProfile>,
    api_key: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ProviderEntry {
    fn new(profile: Arc<dyn ProviderProfile>) -> Self {
        Self {
            profile,
            api_key: None,
            timeout: Duration::from_secs(default_upstream_timeout()),
            connect_timeout: Duration::from_secs(default_connect_timeout()),
        }
    }

    /// API key, if the upstream is configured
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Provider Registry keyed by upstream family
pub struct ProviderRegistry {
    entries: HashMap<ProviderKind, ProviderEntry>,
}

impl ProviderRegistry {
    /// Registry with default endpoints and no credentials
    pub fn new() -> Self {
        let entries = ProviderKind::ALL
            .into_iter()
            .map(|kind| (kind, ProviderEntry::new(default_profile(kind, None))))
            .collect();
        Self { entries }
    }

    /// Registry from configuration entries; later entries for the same
    /// family replace earlier ones
    pub fn from_config(providers: &[ProviderConfig]) -> Self {
        let mut registry = Self::new();
        for config in providers {
            let mut entry =
                ProviderEntry::new(default_profile(config.provider_type, config.base_url.as_deref()));
            entry.api_key = config.usable_api_key().map(str::to_string);
            entry.timeout = Duration::from_secs(config.timeout);
            entry.connect_timeout = Duration::from_secs(config.connect_timeout);
            registry.entries.insert(config.provider_type, entry);
        }
        registry
    }

    /// Replace the profile for a family, keeping its settings
    pub fn register(&mut self, profile: Arc<dyn ProviderProfile>) {
        let kind = profile.kind();
        match self.entries.get_mut(&kind) {
            Some(entry) => entry.profile = profile,
            None => {
                self.entries.insert(kind, ProviderEntry::new(profile));
            }
        }
    }

    /// Get the entry for a family
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderEntry> {
        self.entries.get(&kind)
    }

    /// Families with an API key
    pub fn configured(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.api_key.is_some())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }

    /// Get provider count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("provider_count", &self.entries.len())
            .field("configured", &self.configured())
            .finish()
    }
}

fn default_profile(kind: ProviderKind, base_url: Option<&str>) -> Arc<dyn ProviderProfile> {
    match (kind, base_url) {
        (ProviderKind::Anthropic, Some(url)) => Arc::new(AnthropicProfile::new(url)),
        (ProviderKind::Anthropic, None) => Arc::new(AnthropicProfile::default()),
        (ProviderKind::OpenAI, Some(url)) => Arc::new(OpenAIProfile::new(url)),
        (ProviderKind::OpenAI, None) => Arc::new(OpenAIProfile::default()),
        (ProviderKind::Google, Some(url)) => Arc::new(GeminiProfile::new(url)),
        (ProviderKind::Google, None) => Arc::new(GeminiProfile::default()),
    }
}
