use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};
use shared_error::AppError;
use tracing::debug;
use uuid::Uuid;

use shared_jwt::Claims;

pub trait JwtSecretProvider {
    fn get_jwt_secret(&self) -> &[u8];
}

/// Authenticated user information extracted from the bearer access token.
///
/// This extractor only proves who the caller is. The role here is the
/// issuance-time snapshot; handlers must resolve a `Principal` (re-reading
/// role and managed teams from the identity store) before authorizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role_hint: String,
    pub token_id: Uuid,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            company_id: claims.company_id,
            role_hint: claims.role,
            token_id: claims.jti,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + JwtSecretProvider,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::NotAuthenticated("missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::NotAuthenticated("expected Bearer token".into()))?;

        let claims = shared_jwt::decode_access_jwt(token, state.get_jwt_secret())?;

        debug!(
            user_id = %claims.sub,
            company_id = %claims.company_id,
            "Access token verified"
        );

        Ok(AuthUser::from_claims(claims))
    }
}
