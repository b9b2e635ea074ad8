//! Health check endpoint

use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use tracing::error;

/// Liveness plus a database round trip; 503 when storage is unreachable
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.storage.health_check().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "error",
                "message": "Service unavailable",
            }))
        }
    }
}
