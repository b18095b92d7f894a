//! Pure authorization checks.
//!
//! - No IO
//! - No panics
//! - No business logic (policy only)

use siphon_core::{CustomerId, EmployeeId, SupplierId};

use crate::{Role, claims::Claims, error::AuthError};

/// Authorization context for a request: the validated token's identity.
///
/// Built from claims after the principal has been re-resolved against
/// storage, so holding one implies the account still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
    pub role: Role,
    pub customer_id: Option<CustomerId>,
    pub supplier_id: Option<SupplierId>,
    pub employee_id: Option<EmployeeId>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            username: claims.sub.clone(),
            role: claims.role,
            customer_id: claims.customer_id,
            supplier_id: claims.supplier_id,
            employee_id: claims.employee_id,
        }
    }
}

/// The owning principal of a resource, for owner-or-role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Customer(CustomerId),
    Supplier(SupplierId),
    Employee(EmployeeId),
}

/// Set-membership role check.
pub fn require_role(ctx: &AuthContext, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Allow when the role check passes, or when the resource's owning id matches
/// the context's role-specific id (a customer acting on their own record).
pub fn require_owner_or_role(
    ctx: &AuthContext,
    allowed: &[Role],
    owner: Owner,
) -> Result<(), AuthError> {
    if require_role(ctx, allowed).is_ok() {
        return Ok(());
    }

    let is_owner = match owner {
        Owner::Customer(id) => ctx.customer_id == Some(id),
        Owner::Supplier(id) => ctx.supplier_id == Some(id),
        Owner::Employee(id) => ctx.employee_id == Some(id),
    };

    if is_owner { Ok(()) } else { Err(AuthError::Forbidden) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_ctx(id: i64) -> AuthContext {
        AuthContext {
            username: "vera".into(),
            role: Role::Customer,
            customer_id: Some(CustomerId::new(id)),
            supplier_id: None,
            employee_id: None,
        }
    }

    #[test]
    fn role_membership_is_checked() {
        let ctx = customer_ctx(5);
        assert!(require_role(&ctx, &[Role::Customer, Role::Admin]).is_ok());
        assert_eq!(require_role(&ctx, &[Role::Admin]), Err(AuthError::Forbidden));
    }

    #[test]
    fn owner_may_act_on_own_record() {
        let ctx = customer_ctx(5);
        let own = Owner::Customer(CustomerId::new(5));
        let other = Owner::Customer(CustomerId::new(6));

        assert!(require_owner_or_role(&ctx, &[Role::Admin], own).is_ok());
        assert_eq!(
            require_owner_or_role(&ctx, &[Role::Admin], other),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn owner_check_does_not_cross_roles() {
        // A customer with id 5 is not the supplier with id 5.
        let ctx = customer_ctx(5);
        let supplier = Owner::Supplier(SupplierId::new(5));
        assert_eq!(
            require_owner_or_role(&ctx, &[Role::Admin], supplier),
            Err(AuthError::Forbidden)
        );
    }
}
