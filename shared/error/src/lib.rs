use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    // Database errors
    Database(sqlx::Error),

    // Validation errors
    InvalidInput(String),
    WeakPassword(String), // First failing policy rule

    // Authentication errors
    InvalidCredential,
    LoginLocked(u64), // Retry-After seconds
    Expired,
    BadSignature,
    MalformedToken,
    WrongTokenType,
    RefreshReplayDetected,
    NotAuthenticated(String),
    StoredHashCorrupt,

    // Authorization errors
    NotAuthorized(String),
    CrossTenantAccess,

    // Business logic errors
    NotFound(String),
    Conflict(String),
    OverlappingRequest,
    NotPending,
    AllocationExceeded,
    DuplicateUniqueKey(String),
    DateInPast,
    NoActivePeriod,
    InviteInvalid,
    AuditImmutable,

    // Throttling
    RateLimited(u64), // Retry-After seconds

    // Internal errors
    Timeout,
    ConfigError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::WeakPassword(rule) => write!(f, "Password too weak: {}", rule),
            AppError::InvalidCredential => write!(f, "Invalid credentials"),
            AppError::LoginLocked(secs) => {
                write!(f, "Account temporarily locked, retry after {}s", secs)
            },
            AppError::Expired => write!(f, "Token expired"),
            AppError::BadSignature => write!(f, "Token signature invalid"),
            AppError::MalformedToken => write!(f, "Token malformed"),
            AppError::WrongTokenType => write!(f, "Wrong token type"),
            AppError::RefreshReplayDetected => write!(f, "Refresh token replay detected"),
            AppError::NotAuthenticated(msg) => write!(f, "Not authenticated: {}", msg),
            AppError::StoredHashCorrupt => write!(f, "Stored credential unusable"),
            AppError::NotAuthorized(msg) => write!(f, "Not authorized: {}", msg),
            AppError::CrossTenantAccess => write!(f, "Resource not found"),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::OverlappingRequest => {
                write!(f, "Request overlaps an existing vacation request")
            },
            AppError::NotPending => write!(f, "Request is no longer pending"),
            AppError::AllocationExceeded => write!(f, "Vacation allocation exceeded"),
            AppError::DuplicateUniqueKey(what) => write!(f, "Already exists: {}", what),
            AppError::DateInPast => write!(f, "Start date must be today or later"),
            AppError::NoActivePeriod => write!(f, "No active vacation period covers this date"),
            AppError::InviteInvalid => write!(f, "Invalid or expired invitation"),
            AppError::AuditImmutable => write!(f, "Audit events cannot be modified"),
            AppError::RateLimited(secs) => write!(f, "Rate limited, retry after {}s", secs),
            AppError::Timeout => write!(f, "Operation timed out"),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Stable machine-readable code surfaced in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::WeakPassword(_) => "WEAK_PASSWORD",
            AppError::InvalidCredential => "INVALID_CREDENTIAL",
            AppError::LoginLocked(_) => "LOGIN_LOCKED",
            AppError::Expired => "TOKEN_EXPIRED",
            AppError::BadSignature => "BAD_SIGNATURE",
            AppError::MalformedToken => "TOKEN_MALFORMED",
            AppError::WrongTokenType => "WRONG_TOKEN_TYPE",
            AppError::RefreshReplayDetected => "REFRESH_REPLAY_DETECTED",
            AppError::NotAuthenticated(_) => "NOT_AUTHENTICATED",
            AppError::StoredHashCorrupt => "STORED_HASH_CORRUPT",
            AppError::NotAuthorized(_) => "NOT_AUTHORIZED",
            AppError::CrossTenantAccess => "NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::OverlappingRequest => "OVERLAPPING_REQUEST",
            AppError::NotPending => "NOT_PENDING",
            AppError::AllocationExceeded => "ALLOCATION_EXCEEDED",
            AppError::DuplicateUniqueKey(_) => "DUPLICATE_UNIQUE_KEY",
            AppError::DateInPast => "DATE_IN_PAST",
            AppError::NoActivePeriod => "NO_ACTIVE_PERIOD",
            AppError::InviteInvalid => "INVITE_INVALID",
            AppError::AuditImmutable => "AUDIT_IMMUTABLE",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::Timeout => "TIMEOUT",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::WeakPassword(_)
            | AppError::DateInPast
            | AppError::NoActivePeriod => StatusCode::BAD_REQUEST,
            AppError::InvalidCredential
            | AppError::Expired
            | AppError::BadSignature
            | AppError::MalformedToken
            | AppError::WrongTokenType
            | AppError::RefreshReplayDetected
            | AppError::NotAuthenticated(_)
            | AppError::InviteInvalid => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            // Cross-tenant lookups answer 404 so foreign-tenant ids do not
            // leak existence.
            AppError::CrossTenantAccess | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::OverlappingRequest
            | AppError::NotPending
            | AppError::AllocationExceeded
            | AppError::DuplicateUniqueKey(_)
            | AppError::AuditImmutable => StatusCode::CONFLICT,
            AppError::LoginLocked(_) => StatusCode::LOCKED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_)
            | AppError::ConfigError(_)
            | AppError::Internal(_)
            | AppError::StoredHashCorrupt => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            AppError::LoginLocked(secs) | AppError::RateLimited(secs) => Some(*secs),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let retry_after = self.retry_after();

        // Internal detail stays in the logs; clients get the generic message.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            },
            AppError::ConfigError(msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            },
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

// From implementations for common error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateUniqueKey(db.constraint().unwrap_or("row").to_string())
            },
            sqlx::Error::PoolTimedOut => AppError::Timeout,
            _ => AppError::Database(err),
        }
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_variants_map_to_409() {
        for err in [
            AppError::OverlappingRequest,
            AppError::NotPending,
            AppError::AllocationExceeded,
            AppError::DuplicateUniqueKey("users_email_key".into()),
        ] {
            assert_eq!(err.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn lockout_maps_to_423_with_retry_after() {
        let err = AppError::LoginLocked(900);
        assert_eq!(err.status(), StatusCode::LOCKED);
        assert_eq!(err.retry_after(), Some(900));
    }

    #[test]
    fn cross_tenant_answers_not_found() {
        let err = AppError::CrossTenantAccess;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn internal_detail_not_leaked_to_clients() {
        let response = AppError::Internal("pool exhausted at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
