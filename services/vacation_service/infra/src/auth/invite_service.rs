use async_trait::async_trait;
use shared_auth::{authorize, Action, Principal, Resource};
use shared_error::AppError;
use shared_types::SharedClock;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{actions, NewAuditEvent},
    repository::AuditSink,
};
use vacation_service_core::domains::auth::domain::{
    model::InviteToken, repository::InviteRepository, service::InviteService,
};
use vacation_service_core::domains::auth::dto::{AcceptInviteReq, CreateInviteReq, InviteResp};
use vacation_service_core::domains::auth::utils::{
    password::{validate_password_policy, PasswordHasher},
    token::{generate_opaque_token, hash_token},
};
use vacation_service_core::domains::identity::domain::{
    model::{TeamMembership, User},
    repository::{MembershipRepository, OrgRepository, UserRepository},
};
use vacation_service_core::domains::identity::dto::UserInfo;

use super::smtp_sender::{EmailContent, EmailSender};

fn invite_to_resp(invite: &InviteToken, token: Option<String>) -> InviteResp {
    InviteResp {
        id: invite.invite_id,
        email: invite.email.clone(),
        role: invite.invited_role,
        expires_at: invite.expires_at,
        used_at: invite.used_at,
        created_at: invite.created_at,
        token,
    }
}

/// Implementation of InviteService
pub struct InviteServiceImpl<IR, UR, MR, OR>
where
    IR: InviteRepository,
    UR: UserRepository,
    MR: MembershipRepository,
    OR: OrgRepository,
{
    invite_repo: IR,
    user_repo: UR,
    membership_repo: MR,
    org_repo: OR,
    hasher: Arc<PasswordHasher>,
    mailer: Arc<dyn EmailSender>,
    audit: Arc<dyn AuditSink>,
    clock: SharedClock,
    invite_token_lifetime: i64,
}

impl<IR, UR, MR, OR> InviteServiceImpl<IR, UR, MR, OR>
where
    IR: InviteRepository,
    UR: UserRepository,
    MR: MembershipRepository,
    OR: OrgRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invite_repo: IR,
        user_repo: UR,
        membership_repo: MR,
        org_repo: OR,
        hasher: Arc<PasswordHasher>,
        mailer: Arc<dyn EmailSender>,
        audit: Arc<dyn AuditSink>,
        clock: SharedClock,
        invite_token_lifetime: i64,
    ) -> Self {
        Self {
            invite_repo,
            user_repo,
            membership_repo,
            org_repo,
            hasher,
            mailer,
            audit,
            clock,
            invite_token_lifetime,
        }
    }

    fn send_invite_mail(&self, email: &str, token: &str) {
        if !self.mailer.is_available() {
            return;
        }
        let mailer = Arc::clone(&self.mailer);
        let content = EmailContent {
            to: email.to_string(),
            subject: "You have been invited".to_string(),
            text_body: format!(
                "You have been invited to the vacation planner.\n\n\
                 Use this token to accept the invitation: {}\n\n\
                 The token expires; ask for a new invitation if it no longer works.",
                token
            ),
        };
        // Fire-and-forget: mail failure must not fail the invitation.
        tokio::spawn(async move {
            if let Err(e) = mailer.send(content).await {
                tracing::warn!("Failed to send invite mail: {}", e);
            }
        });
    }
}

#[async_trait]
impl<IR, UR, MR, OR> InviteService for InviteServiceImpl<IR, UR, MR, OR>
where
    IR: InviteRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    MR: MembershipRepository + Send + Sync,
    OR: OrgRepository + Send + Sync,
{
    async fn create_invite(
        &self,
        principal: &Principal,
        req: CreateInviteReq,
    ) -> Result<InviteResp, AppError> {
        authorize(principal, Action::Create, Resource::Invite)?;
        let now = self.clock.now();

        if self.user_repo.email_exists(&req.email).await? {
            return Err(AppError::DuplicateUniqueKey("user email".into()));
        }
        if self
            .invite_repo
            .find_pending_by_email(principal.company_id, &req.email, now)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "a pending invitation already exists for this email".into(),
            ));
        }

        // Referenced org rows must live in the inviting company.
        if let Some(function_id) = req.function_id {
            self.org_repo
                .find_function(principal.company_id, function_id)
                .await?
                .ok_or_else(|| AppError::NotFound("function".into()))?;
        }
        for team_id in &req.team_ids {
            self.org_repo
                .find_team(principal.company_id, *team_id)
                .await?
                .ok_or_else(|| AppError::NotFound("team".into()))?;
        }

        let (raw_token, token_hash) = generate_opaque_token();
        let invite = InviteToken {
            invite_id: Uuid::now_v7(),
            company_id: principal.company_id,
            function_id: req.function_id,
            team_ids: sqlx::types::Json(req.team_ids.clone()),
            token_hash,
            email: req.email.clone(),
            invited_role: req.role,
            invited_by: principal.user_id,
            expires_at: now + chrono::Duration::seconds(self.invite_token_lifetime),
            used_at: None,
            created_at: now,
        };

        let saved = self.invite_repo.create(&invite).await?;

        self.audit
            .record(
                NewAuditEvent::new(principal.company_id, actions::INVITE_CREATED, "invite")
                    .actor(principal.user_id)
                    .entity(saved.invite_id),
            )
            .await?;

        tracing::info!(
            invite_id = %saved.invite_id,
            company_id = %principal.company_id,
            invited_role = %saved.invited_role,
            "invite_created"
        );
        tracing::debug!(invite_id = %saved.invite_id, email = %saved.email, "invite_created_pii");

        self.send_invite_mail(&saved.email, &raw_token);

        Ok(invite_to_resp(&saved, Some(raw_token)))
    }

    async fn accept_invite(&self, req: AcceptInviteReq) -> Result<UserInfo, AppError> {
        let now = self.clock.now();
        let token_hash = hash_token(&req.token);

        let invite = self
            .invite_repo
            .find_by_hash(&token_hash)
            .await?
            .ok_or(AppError::InviteInvalid)?;

        if !invite.is_valid(now) {
            return Err(AppError::InviteInvalid);
        }

        if self.user_repo.email_exists(&invite.email).await? {
            return Err(AppError::DuplicateUniqueKey("user email".into()));
        }

        validate_password_policy(&req.password)?;

        let hasher = Arc::clone(&self.hasher);
        let password = req.password.clone();
        let password_hash = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

        let function_id = match invite.function_id {
            Some(function_id) => function_id,
            None => {
                self.org_repo
                    .ensure_default_function(invite.company_id)
                    .await?
                    .function_id
            },
        };

        let user = User {
            user_id: Uuid::now_v7(),
            company_id: invite.company_id,
            function_id,
            email: invite.email.clone(),
            password_hash,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            role: invite.invited_role,
            is_active: true,
            // Reaching the mailed token proves control of the mailbox.
            email_verified: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self.user_repo.create(&user).await?;

        // Single-shot guard. Losing the race means another acceptance won
        // between our validity check and here; compensate by removing the
        // user we just created.
        let marked = self.invite_repo.mark_used(invite.invite_id, now).await?;
        if !marked {
            tracing::warn!(
                invite_id = %invite.invite_id,
                "Invite already used; rolling back created user"
            );
            self.user_repo
                .soft_delete(created.company_id, created.user_id)
                .await?;
            return Err(AppError::InviteInvalid);
        }

        for (index, team_id) in invite.team_ids.0.iter().enumerate() {
            self.membership_repo
                .add_member(&TeamMembership {
                    membership_id: Uuid::now_v7(),
                    company_id: invite.company_id,
                    user_id: created.user_id,
                    team_id: *team_id,
                    is_primary: index == 0,
                    joined_at: now,
                    left_at: None,
                })
                .await?;
        }

        self.audit
            .record(
                NewAuditEvent::new(invite.company_id, actions::INVITE_ACCEPTED, "invite")
                    .actor(created.user_id)
                    .entity(invite.invite_id),
            )
            .await?;

        tracing::info!(
            invite_id = %invite.invite_id,
            company_id = %invite.company_id,
            user_id = %created.user_id,
            "invite_accepted"
        );

        Ok(UserInfo::from(&created))
    }

    async fn list_invites(
        &self,
        principal: &Principal,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InviteResp>, AppError> {
        authorize(principal, Action::List, Resource::Invite)?;

        let invites = self
            .invite_repo
            .list_by_company(principal.company_id, limit, offset)
            .await?;

        Ok(invites.iter().map(|i| invite_to_resp(i, None)).collect())
    }

    async fn revoke_invite(&self, principal: &Principal, invite_id: Uuid) -> Result<(), AppError> {
        authorize(principal, Action::Delete, Resource::Invite)?;

        let deleted = self
            .invite_repo
            .delete(principal.company_id, invite_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound("invite".into()));
        }

        self.audit
            .record(
                NewAuditEvent::new(principal.company_id, actions::INVITE_REVOKED, "invite")
                    .actor(principal.user_id)
                    .entity(invite_id),
            )
            .await?;

        Ok(())
    }

    async fn resend_invite(
        &self,
        principal: &Principal,
        invite_id: Uuid,
    ) -> Result<InviteResp, AppError> {
        authorize(principal, Action::Create, Resource::Invite)?;
        let now = self.clock.now();

        let (raw_token, token_hash) = generate_opaque_token();
        let updated = self
            .invite_repo
            .update_for_resend(
                principal.company_id,
                invite_id,
                &token_hash,
                now + chrono::Duration::seconds(self.invite_token_lifetime),
            )
            .await?;

        tracing::info!(
            invite_id = %updated.invite_id,
            company_id = %principal.company_id,
            new_expires_at = %updated.expires_at,
            "invite_resent"
        );

        self.send_invite_mail(&updated.email, &raw_token);

        Ok(invite_to_resp(&updated, Some(raw_token)))
    }
}
