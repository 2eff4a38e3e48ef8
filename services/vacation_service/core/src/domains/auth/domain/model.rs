use chrono::{DateTime, Utc};
use shared_auth::Role;
use sqlx::FromRow;
use uuid::Uuid;

/// Refresh-token record. Only the SHA-256 hash of the opaque token material
/// is persisted; the raw token lives solely in the issuing response.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub token_id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub is_remember_me: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_revoked()
    }
}

/// Invitation created by an admin; accepting it births the user.
#[derive(Debug, Clone, FromRow)]
pub struct InviteToken {
    pub invite_id: Uuid,
    pub company_id: Uuid,
    pub function_id: Option<Uuid>,
    /// Teams the invited user joins on acceptance.
    pub team_ids: sqlx::types::Json<Vec<Uuid>>,
    pub token_hash: String,
    pub email: String,
    pub invited_role: Role,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteToken {
    /// Unused and unexpired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}

/// Single-use password reset token, hash-at-rest.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub token_id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_liveness() {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            token_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "h".into(),
            expires_at: now + chrono::Duration::days(7),
            revoked_at: None,
            last_used_at: None,
            user_agent: None,
            ip_address: None,
            is_remember_me: false,
            created_at: now,
        };
        assert!(record.is_live(now));

        let revoked = RefreshTokenRecord {
            revoked_at: Some(now),
            ..record.clone()
        };
        assert!(!revoked.is_live(now));

        let expired = RefreshTokenRecord {
            expires_at: now - chrono::Duration::seconds(1),
            ..record
        };
        assert!(!expired.is_live(now));
    }
}
