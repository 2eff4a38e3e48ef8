mod company_repository;
mod identity_service;
mod membership_repository;
mod principal_resolver;
mod user_repository;

pub use company_repository::{PgCompanyRepository, PgOrgRepository};
pub use identity_service::IdentityServiceImpl;
pub use membership_repository::PgMembershipRepository;
pub use principal_resolver::PgPrincipalResolver;
pub use user_repository::PgUserRepository;
