use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    error::{AppError, AppResult, UNAUTHENTICATED_MESSAGE},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,    // user ID
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Mints and validates bearer tokens. Built once from config and never rotated.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for TokenManager {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenManager {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.clamp(0, MAX_TTL_MINUTES) as u64) * 60),
        }
    }

    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("jwt encode: {e}")))?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Validates signature, issuer, audience and expiry, returning the user id.
    pub fn authenticate(&self, token: &str) -> AppResult<i64> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::TokenInvalid,
            }
        })?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }

    pub fn identity_from_context(&self, ctx: &RequestContext) -> AppResult<i64> {
        ctx.caller.ok_or(AppError::MissingIdentity)
    }
}

/// Request-scoped bag carrying the caller resolved by the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    caller: Option<i64>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: i64) -> Self {
        Self {
            caller: Some(user_id),
        }
    }

    /// Caller id for log fields only; core logic goes through `identity_from_context`.
    pub fn caller_id(&self) -> Option<i64> {
        self.caller
    }
}

/// Extracts and validates the bearer token, yielding an authenticated context.
pub struct AuthUser(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenManager: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenManager::from_ref(state);
        let unauthenticated = || (StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE.to_string());

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                unauthenticated()
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                unauthenticated()
            })?;

        match tokens.authenticate(token) {
            Ok(user_id) => Ok(AuthUser(RequestContext::authenticated(user_id))),
            Err(AppError::TokenExpired) => {
                warn!("expired token");
                Err(unauthenticated())
            }
            Err(e) => {
                warn!(error = %e, "invalid token");
                Err(unauthenticated())
            }
        }
    }
}
