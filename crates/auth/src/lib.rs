//! `siphon-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it mints and
//! validates bearer tokens, hashes passwords, and answers pure authorization
//! questions. Looking principals up in storage is the caller's job.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod roles;
pub mod token;

pub use authorize::{AuthContext, Owner, require_owner_or_role, require_role};
pub use claims::{Claims, TOKEN_TTL_MINUTES, validate_claims};
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use roles::Role;
pub use token::TokenCodec;
