pub mod audit_handlers;
pub mod client_context;
pub mod cookie_helper;
pub mod export_handlers;
pub mod handlers;
pub mod identity_handlers;
pub mod invitation_handlers;
pub mod middleware;
pub mod vacation_handlers;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use shared_auth::{AuthUser, JwtSecretProvider, Principal};
use shared_config::Config;
use shared_db::PgPool;
use shared_error::AppError;
use shared_rate_limit::{LoginLockout, RateGate};
use shared_types::{SharedClock, SystemClock};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use vacation_service_core::domains::audit::domain::repository::AuditSink;
use vacation_service_core::domains::auth::domain::service::{
    AuthService, InviteService, PasswordResetService,
};
use vacation_service_core::domains::auth::utils::password::PasswordHasher;
use vacation_service_core::domains::identity::domain::service::IdentityService;
use vacation_service_core::domains::vacation::domain::service::{ExportService, VacationService};
use vacation_service_infra::audit::PgAuditSink;
use vacation_service_infra::auth::{
    AuthServiceImpl, EmailSender, InviteServiceImpl, PasswordResetServiceImpl,
    PgInviteRepository, PgPasswordResetRepository, PgSessionRepository, SmtpConfig,
    SmtpEmailSender,
};
use vacation_service_infra::identity::{
    IdentityServiceImpl, PgCompanyRepository, PgMembershipRepository, PgOrgRepository,
    PgPrincipalResolver, PgUserRepository,
};
use vacation_service_infra::ticker::spawn_cleanup_ticker;
use vacation_service_infra::vacation::{PgExportService, PgVacationService};

type ConcreteResolver = PgPrincipalResolver<PgUserRepository, PgMembershipRepository>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub invite_service: Arc<dyn InviteService>,
    pub reset_service: Arc<dyn PasswordResetService>,
    pub identity_service: Arc<dyn IdentityService>,
    pub vacation_service: Arc<dyn VacationService>,
    pub export_service: Arc<dyn ExportService>,
    pub audit_sink: Arc<dyn AuditSink>,
    pub resolver: Arc<ConcreteResolver>,
    pub rate_gate: RateGate,
    pub jwt_secret: Vec<u8>,
}

impl JwtSecretProvider for AppState {
    fn get_jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }
}

/// Build the per-request principal: token claims prove identity, the store
/// provides the current role and managed teams.
pub async fn principal_of(state: &AppState, auth: &AuthUser) -> Result<Principal, AppError> {
    state.resolver.resolve(auth.user_id, auth.company_id).await
}

/// Wire repositories and services into an [`AppState`].
pub fn build_state(pool: PgPool, config: &Config) -> Result<AppState, AppError> {
    let hasher = Arc::new(PasswordHasher::with_params(
        config.hash_time_cost,
        config.hash_memory_kib,
        config.hash_parallelism,
    )?);
    let clock: SharedClock = Arc::new(SystemClock);
    let lockout = LoginLockout::new();
    let rate_gate = RateGate::with_overrides(&config.rate_limit_overrides);

    let user_repo = PgUserRepository::new(pool.clone());
    let company_repo = PgCompanyRepository::new(pool.clone());
    let org_repo = PgOrgRepository::new(pool.clone());
    let membership_repo = PgMembershipRepository::new(pool.clone());
    let session_repo = PgSessionRepository::new(pool.clone());
    let invite_repo = PgInviteRepository::new(pool.clone());
    let reset_repo = PgPasswordResetRepository::new(pool.clone());
    let audit = PgAuditSink::new(pool.clone());
    let audit_sink: Arc<dyn AuditSink> = Arc::new(audit.clone());

    let mailer: Arc<dyn EmailSender> = Arc::new(SmtpEmailSender::new(SmtpConfig {
        host: config.smtp_host.clone().unwrap_or_default(),
        port: config.smtp_port,
        username: config.smtp_username.clone(),
        password: config.smtp_password.clone(),
        from: config.mail_from.clone(),
    })?);

    let auth_service = AuthServiceImpl::new(
        user_repo.clone(),
        session_repo.clone(),
        Arc::clone(&hasher),
        lockout.clone(),
        rate_gate.clone(),
        Arc::clone(&audit_sink),
        Arc::clone(&clock),
        config.jwt_secret.as_bytes().to_vec(),
        config.access_token_lifetime,
        config.refresh_token_lifetime,
        config.remember_me_lifetime,
    );

    let invite_service = InviteServiceImpl::new(
        invite_repo,
        user_repo.clone(),
        membership_repo.clone(),
        org_repo.clone(),
        Arc::clone(&hasher),
        Arc::clone(&mailer),
        Arc::clone(&audit_sink),
        Arc::clone(&clock),
        config.invite_token_lifetime,
    );

    let reset_service = PasswordResetServiceImpl::new(
        user_repo.clone(),
        reset_repo,
        session_repo.clone(),
        Arc::clone(&hasher),
        lockout.clone(),
        Arc::clone(&mailer),
        Arc::clone(&audit_sink),
        Arc::clone(&clock),
        config.reset_token_lifetime,
    );

    let identity_service = IdentityServiceImpl::new(
        user_repo.clone(),
        company_repo,
        org_repo,
        membership_repo.clone(),
        session_repo.clone(),
        Arc::clone(&audit_sink),
    );

    let vacation_service =
        PgVacationService::new(pool.clone(), audit.clone(), Arc::clone(&clock));
    let export_service = PgExportService::new(pool.clone());

    let resolver = Arc::new(PgPrincipalResolver::new(user_repo, membership_repo));

    spawn_cleanup_ticker(Arc::new(session_repo));

    Ok(AppState {
        auth_service: Arc::new(auth_service),
        invite_service: Arc::new(invite_service),
        reset_service: Arc::new(reset_service),
        identity_service: Arc::new(identity_service),
        vacation_service: Arc::new(vacation_service),
        export_service: Arc::new(export_service),
        audit_sink,
        resolver,
        rate_gate,
        jwt_secret: config.jwt_secret.as_bytes().to_vec(),
    })
}

/// Create the application router.
pub fn create_router(state: AppState, config: &Config) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/auth/invite/accept", post(handlers::accept_invite))
        .route(
            "/api/v1/auth/password/reset/request",
            post(handlers::request_password_reset),
        )
        .route(
            "/api/v1/auth/password/reset/confirm",
            post(handlers::confirm_password_reset),
        );

    // Protected routes (bearer access token; handlers resolve the principal
    // and consult the authorization kernel)
    let protected_routes = Router::new()
        .route("/api/v1/auth/password/change", post(handlers::change_password))
        .route("/api/v1/me", get(identity_handlers::me))
        .route("/api/v1/users", get(identity_handlers::list_users))
        .route(
            "/api/v1/users/{user_id}",
            get(identity_handlers::get_user)
                .put(identity_handlers::update_user)
                .delete(identity_handlers::delete_user),
        )
        .route("/api/v1/companies/{company_id}", get(identity_handlers::get_company))
        .route(
            "/api/v1/companies/{company_id}/functions",
            get(identity_handlers::list_functions),
        )
        .route(
            "/api/v1/companies/{company_id}/teams",
            get(identity_handlers::list_teams),
        )
        .route("/api/v1/teams/{team_id}", get(identity_handlers::get_team))
        .route(
            "/api/v1/admin/invites",
            post(invitation_handlers::create_invite).get(invitation_handlers::list_invites),
        )
        .route(
            "/api/v1/admin/invites/{invite_id}",
            axum::routing::delete(invitation_handlers::revoke_invite),
        )
        .route(
            "/api/v1/admin/invites/{invite_id}/resend",
            post(invitation_handlers::resend_invite),
        )
        .route(
            "/api/v1/vacations",
            get(vacation_handlers::list_vacations).post(vacation_handlers::create_vacation),
        )
        .route("/api/v1/vacations/balance", get(vacation_handlers::balance))
        .route(
            "/api/v1/vacations/{request_id}",
            get(vacation_handlers::get_vacation).put(vacation_handlers::modify_vacation),
        )
        .route(
            "/api/v1/vacations/{request_id}/submit",
            post(vacation_handlers::submit_vacation),
        )
        .route(
            "/api/v1/vacations/{request_id}/approve",
            post(vacation_handlers::approve_vacation),
        )
        .route(
            "/api/v1/vacations/{request_id}/reject",
            post(vacation_handlers::reject_vacation),
        )
        .route(
            "/api/v1/vacations/{request_id}/cancel",
            post(vacation_handlers::cancel_vacation),
        )
        .route("/api/v1/exports/vacations", get(export_handlers::export_vacations))
        .route("/api/v1/audit-logs", get(audit_handlers::list_audit_events))
        .route(
            "/api/v1/audit-logs/{event_id}",
            get(audit_handlers::get_audit_event),
        );

    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new().allow_origin(AllowOrigin::list(origins));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::api_rate_limit,
        ))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
