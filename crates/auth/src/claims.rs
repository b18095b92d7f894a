//! Bearer-token claims model (transport-agnostic).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use siphon_core::{CustomerId, EmployeeId, SupplierId};

use crate::{Role, error::AuthError};

/// Fixed token lifetime. No refresh mechanism: clients re-authenticate.
pub const TOKEN_TTL_MINUTES: i64 = 120;

/// Claims embedded in a signed token.
///
/// Exactly one of `customer_id`/`supplier_id`/`employee_id` is set, matching
/// `role`. Timestamps are unix seconds so the codec can enforce expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject username.
    pub sub: String,

    /// Role discovered at issue time.
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<SupplierId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Mint claims for an admin (employee) principal.
    pub fn for_admin(username: &str, id: EmployeeId, issued_at: DateTime<Utc>) -> Self {
        Self::mint(username, Role::Admin, None, None, Some(id), issued_at)
    }

    /// Mint claims for a customer principal.
    pub fn for_customer(username: &str, id: CustomerId, issued_at: DateTime<Utc>) -> Self {
        Self::mint(username, Role::Customer, Some(id), None, None, issued_at)
    }

    /// Mint claims for a supplier principal.
    pub fn for_supplier(username: &str, id: SupplierId, issued_at: DateTime<Utc>) -> Self {
        Self::mint(username, Role::Supplier, None, Some(id), None, issued_at)
    }

    fn mint(
        username: &str,
        role: Role,
        customer_id: Option<CustomerId>,
        supplier_id: Option<SupplierId>,
        employee_id: Option<EmployeeId>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = issued_at + Duration::minutes(TOKEN_TTL_MINUTES);
        Self {
            sub: username.to_string(),
            role,
            customer_id,
            supplier_id,
            employee_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Deterministically validate claims against a clock.
///
/// Signature verification lives in [`crate::TokenCodec`]; this checks only
/// the time window and the role/id pairing.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::Malformed);
    }
    if now.timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }

    let role_id_matches = match claims.role {
        Role::Admin => {
            claims.employee_id.is_some()
                && claims.customer_id.is_none()
                && claims.supplier_id.is_none()
        }
        Role::Customer => {
            claims.customer_id.is_some()
                && claims.employee_id.is_none()
                && claims.supplier_id.is_none()
        }
        Role::Supplier => {
            claims.supplier_id.is_some()
                && claims.customer_id.is_none()
                && claims.employee_id.is_none()
        }
    };
    if !role_id_matches {
        return Err(AuthError::Malformed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_claims_carry_exactly_one_id() {
        let now = Utc::now();
        let claims = Claims::for_customer("vera", CustomerId::new(7), now);
        assert_eq!(claims.customer_id, Some(CustomerId::new(7)));
        assert!(claims.supplier_id.is_none());
        assert!(claims.employee_id.is_none());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_MINUTES * 60);
        assert!(validate_claims(&claims, now).is_ok());
    }

    #[test]
    fn claims_expire_after_ttl() {
        let issued = Utc::now();
        let claims = Claims::for_admin("root", EmployeeId::new(1), issued);

        let just_before = issued + Duration::minutes(TOKEN_TTL_MINUTES) - Duration::seconds(1);
        assert!(validate_claims(&claims, just_before).is_ok());

        let at_expiry = issued + Duration::minutes(TOKEN_TTL_MINUTES);
        assert_eq!(validate_claims(&claims, at_expiry), Err(AuthError::Expired));
    }

    #[test]
    fn mismatched_role_and_id_is_malformed() {
        let now = Utc::now();
        let mut claims = Claims::for_supplier("pipes-r-us", SupplierId::new(3), now);
        claims.customer_id = Some(CustomerId::new(1));
        assert_eq!(validate_claims(&claims, now), Err(AuthError::Malformed));
    }

    #[test]
    fn inverted_time_window_is_malformed() {
        let now = Utc::now();
        let mut claims = Claims::for_admin("root", EmployeeId::new(1), now);
        claims.exp = claims.iat - 60;
        assert_eq!(validate_claims(&claims, now), Err(AuthError::Malformed));
    }
}
