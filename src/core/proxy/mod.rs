//! Metered proxy calls
//!
//! One inbound call: balance precheck, request translation, the upstream
//! exchange, response translation and settlement. Everything here is
//! independent of the HTTP framework serving it.

mod upstream;

pub use upstream::UpstreamClient;

use crate::core::billing::{CallLogEntry, CallStatus, CreditLedger, UserAccount, truncate_error};
use crate::core::ids::SharedToolIds;
use crate::core::providers::{ProviderError, ProviderKind, ProviderProfile, ProviderRegistry};
use crate::core::streaming::{SettleFn, StreamOutcome, create_sse_stream};
use crate::core::types::{CanonicalRequest, CanonicalResponse};
use crate::utils::error::{GatewayError, Result};
use actix_web::web;
use futures::FutureExt;
use futures::stream::{LocalBoxStream, StreamExt};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Model name recorded when the caller sends none
pub const UNKNOWN_MODEL: &str = "unknown";

/// Result of a proxied call
pub enum ProxyReply {
    /// Translated one-shot response with the balance attached
    Complete(CanonicalResponse),
    /// Canonical SSE frames ending in the balance trailer
    Stream(LocalBoxStream<'static, std::result::Result<web::Bytes, GatewayError>>),
}

impl std::fmt::Debug for ProxyReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Orchestrates metered upstream calls
#[derive(Clone)]
pub struct ProxyService {
    providers: Arc<ProviderRegistry>,
    upstream: UpstreamClient,
    ledger: CreditLedger,
    ids: SharedToolIds,
}

/// Everything known about a call once it has been admitted
struct CallContext {
    account: UserAccount,
    kind: ProviderKind,
    profile: Arc<dyn ProviderProfile>,
    model: String,
    started: Instant,
}

impl CallContext {
    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn failure(&self, error: impl Into<String>) -> CallLogEntry {
        CallLogEntry::failure(
            self.account.id,
            self.kind,
            self.model.clone(),
            self.elapsed_ms(),
            error,
        )
    }
}

impl ProxyService {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        ledger: CreditLedger,
        ids: SharedToolIds,
    ) -> Result<Self> {
        let upstream = UpstreamClient::new(&providers)?;
        Ok(Self {
            providers,
            upstream,
            ledger,
            ids,
        })
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Serve one call for an authenticated account.
    ///
    /// Every outcome leaves one audit row, including calls refused before
    /// any upstream work.
    pub async fn handle(
        &self,
        account: UserAccount,
        kind: ProviderKind,
        mut request: CanonicalRequest,
    ) -> Result<ProxyReply> {
        let started = Instant::now();
        if request.model.trim().is_empty() {
            request.model = UNKNOWN_MODEL.to_string();
        }

        let (profile, api_key) = match self.admit(&account, kind).await {
            Ok(admitted) => admitted,
            Err(e) => {
                let entry = CallLogEntry::failure(
                    account.id,
                    kind,
                    request.model.clone(),
                    started.elapsed().as_millis() as u64,
                    e.to_string(),
                );
                self.ledger.record_failure(entry).await;
                return Err(e);
            }
        };
        let streaming = request.stream;

        let call = CallContext {
            account,
            kind,
            profile,
            model: request.model.clone(),
            started,
        };

        let (body, url, headers) = match prepare(call.profile.as_ref(), &request, &api_key) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.ledger.record_failure(call.failure(e.audit_message())).await;
                return Err(e.into());
            }
        };

        info!(
            user_id = %call.account.id,
            provider = %kind,
            model = %call.model,
            streaming,
            "Proxying call"
        );

        let response = match self
            .upstream
            .post_json(kind, &url, headers, &body, streaming)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %kind, error = %e, "Upstream request failed");
                self.ledger.record_failure(call.failure(e.audit_message())).await;
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                provider = %kind,
                status = status.as_u16(),
                body = %truncate_error(&text),
                "Upstream rejected call"
            );
            self.ledger.record_failure(call.failure(truncate_error(&text))).await;
            return Err(ProviderError::api_error(kind.as_str(), status.as_u16(), text).into());
        }

        if streaming {
            Ok(ProxyReply::Stream(self.stream_reply(call, response)))
        } else {
            self.complete_reply(call, response).await.map(ProxyReply::Complete)
        }
    }

    /// Balance precheck and upstream credentials
    async fn admit(
        &self,
        account: &UserAccount,
        kind: ProviderKind,
    ) -> Result<(Arc<dyn ProviderProfile>, String)> {
        self.ledger.precheck(account).await?;

        let entry = self
            .providers
            .get(kind)
            .ok_or_else(|| GatewayError::ProviderNotConfigured(kind.to_string()))?;
        let api_key = entry
            .api_key()
            .ok_or_else(|| GatewayError::ProviderNotConfigured(kind.to_string()))?;
        Ok((entry.profile.clone(), api_key.to_string()))
    }

    async fn complete_reply(
        &self,
        call: CallContext,
        response: reqwest::Response,
    ) -> Result<CanonicalResponse> {
        let provider = call.kind.as_str();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                let error = ProviderError::response_parsing(provider, e.to_string());
                self.ledger.record_failure(call.failure(error.audit_message())).await;
                return Err(error.into());
            }
        };

        let usage = call.profile.extract_usage(&body);
        let mut translated = match call.profile.translate_response(body, self.ids.as_ref()) {
            Ok(translated) => translated,
            Err(e) => {
                self.ledger.record_failure(call.failure(e.audit_message())).await;
                return Err(e.into());
            }
        };

        let entry = CallLogEntry::success(
            call.account.id,
            call.kind,
            call.model.clone(),
            usage,
            0,
            call.elapsed_ms(),
        );
        translated.meta = Some(self.ledger.settle(&call.account, entry).await);
        Ok(translated)
    }

    fn stream_reply(
        &self,
        call: CallContext,
        response: reqwest::Response,
    ) -> LocalBoxStream<'static, std::result::Result<web::Bytes, GatewayError>> {
        let ledger = self.ledger.clone();
        let CallContext {
            account,
            kind,
            profile,
            model,
            ..
        } = call;

        let settle: SettleFn = Box::new(move |outcome: StreamOutcome| {
            async move {
                let mut entry = CallLogEntry::success(
                    account.id,
                    kind,
                    model,
                    outcome.usage,
                    0,
                    outcome.duration_ms,
                );
                if let Some(error) = outcome.error {
                    entry.status = CallStatus::Error;
                    entry.error_message = Some(truncate_error(&error));
                } else if outcome.abandoned {
                    entry.error_message = Some("client disconnected".to_string());
                }
                Some(ledger.settle(&account, entry).await)
            }
            .boxed()
        });

        create_sse_stream(response.bytes_stream(), profile, self.ids.clone(), settle).boxed_local()
    }
}

/// Upstream body, URL and headers for a request
fn prepare(
    profile: &dyn ProviderProfile,
    request: &CanonicalRequest,
    api_key: &str,
) -> std::result::Result<(Value, String, HeaderMap), ProviderError> {
    let mut body = profile.build_request(request)?;
    if !request.stream {
        profile.prepare_one_shot(&mut body);
    }
    let url = profile.build_url(&request.model, request.stream, api_key)?;
    let headers = profile.build_headers(api_key)?;
    Ok((body, url, headers))
}

impl std::fmt::Debug for ProxyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyService")
            .field("providers", &self.providers)
            .field("ledger", &self.ledger)
            .finish()
    }
}
