use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a user within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated actor performing an operation.
///
/// Resolved once per request after token verification: the role and managed
/// team set are re-read from the identity store, never trusted from token
/// claims, so a demoted manager authorizes at their current level.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: Role,
    /// Teams this principal manages (empty unless role is Manager).
    pub managed_team_ids: Vec<Uuid>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn manages_team(&self, team_id: Uuid) -> bool {
        self.managed_team_ids.contains(&team_id)
    }

    pub fn manages_any_of(&self, team_ids: &[Uuid]) -> bool {
        team_ids.iter().any(|t| self.manages_team(*t))
    }
}
