//! Configuration loading from disk and environment

use creditgate::config::Config;
use creditgate::core::providers::{ProviderKind, ProviderRegistry};
use creditgate::utils::error::GatewayError;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const SECRET: &str = "integration-secret-that-is-long-enough-to-pass";

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/gateway.yaml")
}

fn write_yaml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_shipped_config_parses() {
    let config = Config::from_file(shipped_config()).await.unwrap();

    assert_eq!(config.server().port, 8000);
    assert_eq!(config.providers().len(), 3);
    assert_eq!(config.billing().surcharge_multiplier, 1.2);
    assert!(!config.billing().recharge.is_enabled());
}

#[tokio::test]
async fn test_shipped_config_needs_secret_from_environment() {
    let mut config = Config::from_file(shipped_config()).await.unwrap();
    assert!(matches!(config.validate(), Err(GatewayError::Config(_))));

    let vars: HashMap<&str, &str> = [("JWT_SECRET", SECRET), ("ANTHROPIC_API_KEY", "ak-1")]
        .into_iter()
        .collect();
    config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

    assert!(config.validate().is_ok());
    let registry = ProviderRegistry::from_config(config.providers());
    assert_eq!(registry.configured(), vec![ProviderKind::Anthropic]);
    let anthropic = registry.get(ProviderKind::Anthropic).unwrap();
    assert_eq!(anthropic.api_key(), Some("ak-1"));
}

#[tokio::test]
async fn test_load_validates() {
    let file = write_yaml(&format!(
        r#"
auth:
  jwt_secret: "{}"
billing:
  surcharge_multiplier: -1.0
"#,
        SECRET
    ));

    let err = Config::load(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("Surcharge multiplier"));
}

#[tokio::test]
async fn test_pricing_overrides_and_rate_limit() {
    let file = write_yaml(&format!(
        r#"
auth:
  jwt_secret: "{}"
billing:
  pricing:
    house-model:
      input: 1.0
      output: 2.0
rate_limit:
  max_requests: 5
  window_secs: 10
"#,
        SECRET
    ));

    let config = Config::from_file(file.path()).await.unwrap();
    assert!(config.validate().is_ok());

    let entry = &config.billing().pricing["house-model"];
    assert_eq!(entry.input, 1.0);
    assert_eq!(entry.output, 2.0);
    assert_eq!(entry.cache_read, None);
    assert_eq!(config.gateway.rate_limit.max_requests, 5);
}

#[tokio::test]
async fn test_invalid_provider_url_rejected() {
    let file = write_yaml(&format!(
        r#"
auth:
  jwt_secret: "{}"
providers:
  - name: "openai"
    provider_type: "openai"
    base_url: "not a url"
"#,
        SECRET
    ));

    let config = Config::from_file(file.path()).await.unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Provider config error"));
}
