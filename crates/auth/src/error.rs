use thiserror::Error;

/// Authentication/authorization failure.
///
/// `InvalidCredentials` deliberately covers both "unknown username" and
/// "wrong password"; callers must not be able to tell them apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("token has expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("principal no longer exists")]
    PrincipalGone,

    #[error("insufficient privileges")]
    Forbidden,
}
