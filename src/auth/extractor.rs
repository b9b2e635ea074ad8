//! Request extractor for authenticated accounts

use crate::core::billing::UserAccount;
use crate::server::AppState;
use crate::utils::error::GatewayError;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures::future::LocalBoxFuture;

/// The verified caller of a request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserAccount);

impl AuthenticatedUser {
    pub fn into_inner(self) -> UserAccount {
        self.0
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = UserAccount;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = GatewayError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Box::pin(async move {
            let state = state.ok_or_else(|| GatewayError::internal("Application state missing"))?;
            let account = state.auth.authenticate(authorization.as_deref()).await?;
            Ok(AuthenticatedUser(account))
        })
    }
}
