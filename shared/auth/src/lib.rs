//! Authorization kernel.
//!
//! Resolves effective permissions for a [`Principal`] and emits the
//! [`ScopePredicate`] every data-access call must consume. Decisions follow
//! a fixed role/resource matrix; object-level tenant checks surface
//! cross-tenant ids as not-found.

pub mod extractors;
pub mod kernel;
pub mod principal;

pub use extractors::{AuthUser, JwtSecretProvider};
pub use kernel::{authorize, check_same_company, decide, Action, Decision, Resource, ScopePredicate};
pub use principal::{Principal, Role};
