mod auth_service;
mod invite_repository;
mod invite_service;
mod password_reset_service;
mod reset_repository;
mod session_repository;
mod smtp_sender;

pub use auth_service::AuthServiceImpl;
pub use invite_repository::PgInviteRepository;
pub use invite_service::InviteServiceImpl;
pub use password_reset_service::PasswordResetServiceImpl;
pub use reset_repository::PgPasswordResetRepository;
pub use session_repository::PgSessionRepository;
pub use smtp_sender::{EmailContent, EmailSender, SmtpConfig, SmtpEmailSender};
