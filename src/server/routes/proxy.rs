//! Metered proxy endpoint

use crate::auth::AuthenticatedUser;
use crate::core::providers::ProviderKind;
use crate::core::proxy::ProxyReply;
use crate::core::types::CanonicalRequest;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::debug;

/// Header naming the upstream family for a call
pub const PROVIDER_HEADER: &str = "x-provider";

/// POST /api/v1/proxy
pub async fn proxy(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let kind = provider_from_request(&req)?;

    let limit = state.rate_limiter.check_and_record(&user.id.to_string()).await;
    if !limit.allowed {
        debug!(user_id = %user.id, retry_after = ?limit.retry_after_secs, "Proxy rate limit exceeded");
        return Err(GatewayError::rate_limit(format!(
            "{} requests per window exceeded",
            limit.limit
        )));
    }

    let request: CanonicalRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::bad_request(format!("Invalid request body: {}", e)))?;

    match state.proxy.handle(user.into_inner(), kind, request).await? {
        ProxyReply::Complete(response) => Ok(HttpResponse::Ok().json(response)),
        ProxyReply::Stream(stream) => Ok(HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, "text/event-stream"))
            .insert_header((CACHE_CONTROL, "no-cache"))
            .insert_header(("X-Accel-Buffering", "no"))
            .streaming(stream)),
    }
}

/// Upstream family named by the request; Anthropic when absent
fn provider_from_request(req: &HttpRequest) -> Result<ProviderKind> {
    match req.headers().get(PROVIDER_HEADER) {
        None => Ok(ProviderKind::Anthropic),
        Some(value) => {
            let name = value
                .to_str()
                .map_err(|_| GatewayError::bad_request("x-provider header is not valid text"))?;
            if name.trim().is_empty() {
                return Ok(ProviderKind::Anthropic);
            }
            Ok(name.parse::<ProviderKind>()?)
        }
    }
}
