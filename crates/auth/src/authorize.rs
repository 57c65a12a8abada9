use thiserror::Error;

use boxoffice_core::UserId;

use crate::{Capability, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing capability '{0}'")]
    MissingCapability(Capability),

    #[error("forbidden: resource belongs to another user")]
    NotOwner,
}

/// Check that the principal's role grants `required`.
///
/// No IO, no panics, no business logic.
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthzError> {
    if principal.can(required) {
        Ok(())
    } else {
        Err(AuthzError::MissingCapability(required))
    }
}

/// Owner-scoped access: the owner or an admin passes.
pub fn ensure_owner_or_admin(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.user_id == owner || principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn authorize_follows_role_policy() {
        let customer = Principal::new(UserId::new(), Role::Customer);
        assert!(authorize(&customer, Capability::BookTickets).is_ok());
        assert_eq!(
            authorize(&customer, Capability::ManageEvents),
            Err(AuthzError::MissingCapability(Capability::ManageEvents))
        );
    }

    #[test]
    fn owner_or_admin() {
        let owner = UserId::new();
        let me = Principal::new(owner, Role::Customer);
        let stranger = Principal::new(UserId::new(), Role::Customer);
        let admin = Principal::new(UserId::new(), Role::Admin);

        assert!(ensure_owner_or_admin(&me, owner).is_ok());
        assert!(ensure_owner_or_admin(&admin, owner).is_ok());
        assert_eq!(ensure_owner_or_admin(&stranger, owner), Err(AuthzError::NotOwner));
    }
}
