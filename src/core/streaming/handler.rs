//! Streaming response handler implementation
//!
//! Pulls the upstream body one read at a time, transcodes it and frames the
//! canonical events as SSE. Settlement runs once: inline after the upstream
//! ends, or from a spawned task if the client goes away first.

use super::transcoder::{self, TranscoderState};
use super::types::Event;
use crate::core::cost::UsageRecord;
use crate::core::ids::SharedToolIds;
use crate::core::providers::ProviderProfile;
use crate::core::types::BalanceMeta;
use crate::utils::error::GatewayError;
use actix_web::web;
use futures::future::BoxFuture;
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// What the stream produced by the time it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub usage: UsageRecord,
    pub duration_ms: u64,
    /// Transport error that cut the upstream short
    pub error: Option<String>,
    /// The client disconnected before the upstream finished
    pub abandoned: bool,
}

/// Deducts and audits a finished stream; returns the balance for the trailer
pub type SettleFn = Box<dyn FnOnce(StreamOutcome) -> BoxFuture<'static, Option<BalanceMeta>> + Send>;

/// Holds the settlement until it runs exactly once
struct SettlementGuard {
    settle: Option<SettleFn>,
    started: Instant,
    usage: UsageRecord,
}

impl SettlementGuard {
    fn new(settle: SettleFn) -> Self {
        Self {
            settle: Some(settle),
            started: Instant::now(),
            usage: UsageRecord::default(),
        }
    }

    fn outcome(&self, error: Option<String>, abandoned: bool) -> StreamOutcome {
        StreamOutcome {
            usage: self.usage,
            duration_ms: self.started.elapsed().as_millis() as u64,
            error,
            abandoned,
        }
    }

    /// Settlement runs on its own task; dropping the stream while it is in
    /// flight only loses the trailer, never the deduction
    async fn settle(&mut self, error: Option<String>) -> Option<BalanceMeta> {
        let settle = self.settle.take()?;
        let task = tokio::spawn(settle(self.outcome(error, false)));
        match task.await {
            Ok(meta) => meta,
            Err(e) => {
                error!(error = %e, "Stream settlement task failed");
                None
            }
        }
    }
}

impl Drop for SettlementGuard {
    fn drop(&mut self) {
        let Some(settle) = self.settle.take() else {
            return;
        };
        let outcome = self.outcome(None, true);
        debug!(usage = ?outcome.usage, "Client disconnected, settling abandoned stream");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    settle(outcome).await;
                });
            }
            Err(_) => error!("No runtime available to settle abandoned stream"),
        }
    }
}

/// Canonical SSE body for one upstream response
pub fn create_sse_stream<S, E>(
    upstream: S,
    profile: Arc<dyn ProviderProfile>,
    ids: SharedToolIds,
    settle: SettleFn,
) -> impl Stream<Item = Result<web::Bytes, GatewayError>>
where
    S: Stream<Item = Result<web::Bytes, E>> + Send + 'static,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut guard = SettlementGuard::new(settle);
        let mut state = TranscoderState::new();
        let mut upstream = Box::pin(upstream);
        let mut failure = None;

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    let events = transcoder::feed(&mut state, profile.as_ref(), ids.as_ref(), &bytes);
                    guard.usage = state.usage();
                    for event in events {
                        if let Some(frame) = encode(&Event::from_canonical(&event)) {
                            yield Ok(frame);
                        }
                    }
                }
                Err(e) => {
                    warn!(provider = %profile.kind(), error = %e, "Upstream stream failed mid-response");
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        // A cut-off stream ends without message_stop
        if failure.is_none() {
            for event in transcoder::finish(&mut state, profile.as_ref(), ids.as_ref()) {
                if let Some(frame) = encode(&Event::from_canonical(&event)) {
                    yield Ok(frame);
                }
            }
        }
        guard.usage = state.usage();

        if let Some(meta) = guard.settle(failure).await {
            if let Some(frame) = encode(&Event::balance(meta)) {
                yield Ok(frame);
            }
        }
    }
}

fn encode(event: &serde_json::Result<Event>) -> Option<web::Bytes> {
    match event {
        Ok(event) => Some(event.to_bytes()),
        Err(e) => {
            error!(error = %e, "Failed to serialize stream event");
            None
        }
    }
}
