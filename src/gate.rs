use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use tracing::{debug, error, trace};

use crate::error::ApiError;
use crate::schemas::AppState;
use crate::session::ActiveSession;

pub const SESSION_COOKIE: &str = "session_token";

/// The signed-in user of a request.
///
/// Taking this extractor is what makes a handler require a login. The token
/// is read from `Authorization: Bearer` first, then from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthSession(pub ActiveSession);

impl AuthSession {
    pub fn account_id(&self) -> i32 {
        self.0.account_id
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }
}

fn request_token(parts: &Parts) -> Option<String> {
    if let Some(auth) = parts.headers.typed_get::<Authorization<Bearer>>() {
        return Some(auth.token().to_string());
    }
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = request_token(parts) else {
            trace!("Request without session token");
            return Err(ApiError::Unauthenticated);
        };

        match state.sessions.current(&token).await {
            Ok(Some(session)) => {
                trace!("Request authenticated as account {}", session.account_id);
                Ok(AuthSession(session))
            }
            Ok(None) => {
                debug!("Unknown or expired session token");
                Err(ApiError::Unauthenticated)
            }
            Err(e) => {
                error!("Failed to look up session: {}", e);
                Err(ApiError::Identity(e))
            }
        }
    }
}
