use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use shared_error::AppError;
use uuid::Uuid;

/// Claims carried by short-lived bearer access tokens.
///
/// The role claim is a hint for clients only. Authorization re-reads the
/// current role from the identity store on every request, so a stale token
/// never grants more than the user's live role.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Company (tenant) ID
    pub company_id: Uuid,

    /// Role snapshot at issuance
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type: always "access" — refresh tokens are opaque, not JWTs
    pub token_type: String,

    /// Token ID for correlation in audit records
    pub jti: Uuid,
}

pub const TOKEN_TYPE_ACCESS: &str = "access";

impl Claims {
    /// Create access token claims expiring `expiration` seconds from `now`.
    pub fn new_access(
        user_id: Uuid,
        company_id: Uuid,
        role: String,
        now: chrono::DateTime<chrono::Utc>,
        expiration: i64,
    ) -> Self {
        let issued = now.timestamp();
        Self {
            sub: user_id,
            company_id,
            role,
            iat: issued,
            exp: issued + expiration,
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            jti: Uuid::new_v4(),
        }
    }
}

/// Encode claims into a JWT token
pub fn encode_jwt(claims: &Claims, secret: &[u8]) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(secret);
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::Internal(format!("Failed to encode JWT: {}", e)))
}

/// Decode and validate an access token.
///
/// Distinguishes expiry, bad signature, wrong token type, and malformed
/// input so callers can surface stable error codes.
pub fn decode_access_jwt(token: &str, secret: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secret);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Expired,
            ErrorKind::InvalidSignature => AppError::BadSignature,
            _ => AppError::MalformedToken,
        })?;

    if claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(AppError::WrongTokenType);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"test_secret_at_least_32_bytes_long!";

    #[test]
    fn encode_decode_round_trip_preserves_claims() {
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();

        let claims = Claims::new_access(user_id, company_id, "admin".to_string(), Utc::now(), 900);
        let token = encode_jwt(&claims, SECRET).unwrap();

        let decoded = decode_access_jwt(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.company_id, company_id);
        assert_eq!(decoded.role, "admin");
        assert_eq!(decoded.token_type, TOKEN_TYPE_ACCESS);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.exp, claims.iat + 900);
    }

    #[test]
    fn expired_token_rejected() {
        let claims = Claims::new_access(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "user".to_string(),
            Utc::now() - chrono::Duration::hours(1),
            900,
        );
        let token = encode_jwt(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_access_jwt(&token, SECRET),
            Err(AppError::Expired)
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let claims = Claims::new_access(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "user".to_string(),
            Utc::now(),
            900,
        );
        let token = encode_jwt(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_access_jwt(&token, b"another_secret_also_32_bytes_long!!"),
            Err(AppError::BadSignature)
        ));
    }

    #[test]
    fn wrong_token_type_rejected() {
        let mut claims = Claims::new_access(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "user".to_string(),
            Utc::now(),
            900,
        );
        claims.token_type = "refresh".to_string();
        let token = encode_jwt(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_access_jwt(&token, SECRET),
            Err(AppError::WrongTokenType)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode_access_jwt("not-a-jwt", SECRET),
            Err(AppError::MalformedToken)
        ));
    }
}
