use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_auth::Role;
use uuid::Uuid;
use validator::Validate;

use crate::domains::identity::dto::UserInfo;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginReq {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Tokens minted by login, refresh, or invite acceptance.
///
/// The raw refresh token is handed to the HTTP layer for the cookie and is
/// never persisted or logged.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// Body of a successful auth response; the refresh token travels only in the
/// HttpOnly cookie.
#[derive(Debug, Serialize)]
pub struct AuthResp {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

impl From<&IssuedSession> for AuthResp {
    fn from(session: &IssuedSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
            user: session.user.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInviteReq {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteReq {
    #[validate(email)]
    pub email: String,
    pub role: Role,
    pub function_id: Option<Uuid>,
    #[serde(default)]
    pub team_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct InviteResp {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Present only in the creating/resending response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequestReq {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetConfirmReq {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordReq {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}
