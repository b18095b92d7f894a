//! Bearer-token middleware.
//!
//! Decodes the token, validates the claims window and role/id pairing, then
//! re-resolves the principal against storage so a deleted account's token
//! stops working before expiry.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use siphon_auth::{AuthContext, AuthError, Role, TokenCodec, validate_claims};
use siphon_infra::Store;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
    pub store: Arc<dyn Store>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let claims = state.codec.decode(token)?;
    validate_claims(&claims, Utc::now())?;

    // The token alone is not proof the account still exists.
    match claims.role {
        Role::Admin => {
            let id = claims.employee_id.ok_or(AuthError::Malformed)?;
            state
                .store
                .get_employee(id)
                .await?
                .ok_or(AuthError::PrincipalGone)?;
        }
        Role::Customer => {
            let id = claims.customer_id.ok_or(AuthError::Malformed)?;
            state
                .store
                .get_customer(id)
                .await?
                .ok_or(AuthError::PrincipalGone)?;
        }
        Role::Supplier => {
            let id = claims.supplier_id.ok_or(AuthError::Malformed)?;
            state
                .store
                .get_supplier(id)
                .await?
                .ok_or(AuthError::PrincipalGone)?;
        }
    }

    req.extensions_mut().insert(AuthContext::from_claims(&claims));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::Malformed)?;
    let header = header.to_str().map_err(|_| AuthError::Malformed)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Malformed)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}
