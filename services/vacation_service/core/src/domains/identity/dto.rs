use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_auth::Role;
use uuid::Uuid;
use validator::Validate;

use super::domain::model::{Company, Function, Team, User};

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub company_id: Uuid,
    pub function_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            company_id: user.company_id,
            function_id: user.function_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserReq {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    /// Role changes are admin-only; the handler enforces this.
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserListResp {
    pub users: Vec<UserInfo>,
    pub total: i64,
    pub page: i32,
    pub page_size: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyResp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
}

impl From<&Company> for CompanyResp {
    fn from(company: &Company) -> Self {
        Self {
            id: company.company_id,
            name: company.name.clone(),
            slug: company.slug.clone(),
            domain: company.domain.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionResp {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub code: String,
}

impl From<&Function> for FunctionResp {
    fn from(function: &Function) -> Self {
        Self {
            id: function.function_id,
            company_id: function.company_id,
            name: function.name.clone(),
            code: function.code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResp {
    pub id: Uuid,
    pub company_id: Uuid,
    pub function_id: Uuid,
    pub name: String,
    pub code: String,
}

impl From<&Team> for TeamResp {
    fn from(team: &Team) -> Self {
        Self {
            id: team.team_id,
            company_id: team.company_id,
            function_id: team.function_id,
            name: team.name.clone(),
            code: team.code.clone(),
        }
    }
}
