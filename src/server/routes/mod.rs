//! HTTP route modules

pub mod account;
pub mod health;
pub mod proxy;

use actix_web::web;

/// Mount every route the gateway serves
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1")
                .route("/proxy", web::post().to(proxy::proxy))
                .service(
                    web::scope("/auth")
                        .route("/status", web::get().to(account::status))
                        .route("/usage", web::get().to(account::usage)),
                ),
        );
}
