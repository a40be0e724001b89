use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::app_config::AppConfig;
use crate::jwt::claims::Claims;
use crate::jwt::jwt_helper::verify_token;

pub const TOKEN_COOKIE: &str = "token";

/// Managed state shared by the token routes and the [`Identity`] guard.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: Option<String>,
    pub enforce: bool,
}

impl From<&AppConfig> for AuthSettings {
    fn from(config: &AppConfig) -> Self {
        AuthSettings {
            secret: config.token_secret.clone(),
            enforce: config.enforce_auth,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no access token presented")]
    Missing,
    #[error("token signing secret is not configured")]
    Unconfigured,
    #[error("invalid access token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Who is calling a mutating route. When enforcement is off, callers without
/// a valid token come through as `Anonymous` instead of being rejected.
#[derive(Debug)]
pub enum Identity {
    Authenticated(Claims),
    Anonymous,
}

impl Identity {
    /// The `email` claim, when the caller presented a token carrying one.
    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Authenticated(claims) => claims.email(),
            Identity::Anonymous => None,
        }
    }
}

fn presented_token(request: &Request<'_>) -> Option<String> {
    if let Some(cookie) = request.cookies().get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(settings) = request.rocket().state::<AuthSettings>() else {
            return Outcome::Error((Status::InternalServerError, AuthError::Unconfigured));
        };

        let verified = match (presented_token(request), settings.secret.as_deref()) {
            (None, _) => Err(AuthError::Missing),
            (Some(_), None) => Err(AuthError::Unconfigured),
            (Some(token), Some(secret)) => verify_token(&token, secret.as_bytes()).map_err(AuthError::from),
        };

        match verified {
            Ok(claims) => Outcome::Success(Identity::Authenticated(claims)),
            Err(error) if settings.enforce => {
                warn!(uri = %request.uri(), error = %error, "rejected unauthenticated request");
                Outcome::Error((Status::Unauthorized, error))
            }
            Err(error) => {
                debug!(uri = %request.uri(), error = %error, "continuing without identity");
                Outcome::Success(Identity::Anonymous)
            }
        }
    }
}
