use chrono::{DateTime, Utc};
use shared_auth::Role;
use sqlx::FromRow;
use uuid::Uuid;

/// Company entity — root of every tenant subtree.
///
/// Every other row carries a `company_id` resolvable without joining across
/// tenants. `settings` holds policy knobs (e.g. `allow_negative_balance`,
/// an unconsumed `holidays` list).
#[derive(Debug, Clone, FromRow)]
pub struct Company {
    pub company_id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub settings: sqlx::types::Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Company {
    /// Policy flag: allow approvals to push an allocation negative.
    pub fn allows_negative_balance(&self) -> bool {
        self.settings
            .get("allow_negative_balance")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Function (department) entity; short code unique within the company.
#[derive(Debug, Clone, FromRow)]
pub struct Function {
    pub function_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Team entity; belongs to a function, short code unique within it.
#[derive(Debug, Clone, FromRow)]
pub struct Team {
    pub team_id: Uuid,
    pub company_id: Uuid,
    pub function_id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// User entity (domain model), mapped directly to the database table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub function_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Membership of a user in a team. Active memberships have `left_at IS NULL`;
/// historical rows are retained for past requests.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMembership {
    pub membership_id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub is_primary: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

/// Assignment of a manager to a team; unique per (manager, team) pair.
#[derive(Debug, Clone, FromRow)]
pub struct ManagerAssignment {
    pub assignment_id: Uuid,
    pub company_id: Uuid,
    pub manager_user_id: Uuid,
    pub team_id: Uuid,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_with_settings(settings: serde_json::Value) -> Company {
        Company {
            company_id: Uuid::new_v4(),
            name: "Acme".into(),
            slug: "acme".into(),
            domain: None,
            settings: sqlx::types::Json(settings),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn negative_balance_defaults_to_deny() {
        let company = company_with_settings(serde_json::json!({}));
        assert!(!company.allows_negative_balance());

        let company = company_with_settings(serde_json::json!({"allow_negative_balance": true}));
        assert!(company.allows_negative_balance());
    }
}
