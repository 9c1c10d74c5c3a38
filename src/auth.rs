use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    identity::{Actor, Identity},
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure carried inside an access token. Claims are signed
/// with the server's secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to fetch the current role
    /// from the users table.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the token must not be
    /// accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// Lifetime of an issued access token.
const TOKEN_TTL_HOURS: i64 = 24;

/// issue_token
///
/// Mints a signed bearer token for a user whose `(username, confirm_code)`
/// pair has already passed the mutation validator. Token issuance is the only
/// write-free step of the confirmation flow; the confirmation code itself is
/// left untouched.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: the actor snapshot the
/// permission evaluator and the handlers work from.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    /// The actor view of this identity, for the permission evaluator.
    pub fn actor(&self) -> Actor {
        Actor::Authenticated(self.0.clone())
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This separates identity
/// resolution (extractor) from the permission decision (evaluator) and from
/// business logic (handler).
///
/// The process:
/// 1. Dependency resolution: Repository and AppConfig from the app state.
/// 2. Local bypass: development-time access via the 'x-user-id' header.
/// 3. Token validation: Bearer token extraction and JWT decoding.
/// 4. DB lookup: fetching the user's current role and existence.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: a known user UUID in the 'x-user-id'
        // header authenticates directly, guarded by the Env check. The user
        // must still exist so the role is loaded from the database.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser(Identity {
                                id: user.id,
                                username: user.username,
                                role: user.role,
                            }));
                        }
                    }
                }
            }
        }
        // In Production, or when the bypass did not resolve, execution falls
        // through to the standard JWT validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        // Expired, malformed and badly-signed tokens are all rejected the
        // same way; the distinction only matters for logs.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let user_id = token_data.claims.sub;

        // Final verification against the database. This prevents access if
        // the user was deleted after the token was issued, and picks up role
        // changes immediately.
        let user = repo
            .get_user(user_id)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser(Identity {
            id: user.id,
            username: user.username,
            role: user.role,
        }))
    }
}
