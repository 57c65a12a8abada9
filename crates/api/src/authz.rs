//! API-side capability guard.
//!
//! Every handler states the capability it needs before touching a service.
//! Ownership checks stay in the services, which know who owns what.

use axum::http::StatusCode;
use axum::response::Response;

use boxoffice_auth::{Capability, authorize};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Fail with 403 unless the caller's role grants `capability`.
pub fn require(principal: &PrincipalContext, capability: Capability) -> Result<(), Response> {
    authorize(principal.principal(), capability).map_err(|e| {
        tracing::debug!(user_id = %principal.user_id(), role = %principal.role(), error = %e, "capability check failed");
        json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "You are not authorized to perform this action",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_auth::{Principal, Role};
    use boxoffice_core::UserId;

    #[test]
    fn customers_cannot_manage_events() {
        let customer = PrincipalContext::new(Principal::new(UserId::new(), Role::Customer));
        assert!(require(&customer, Capability::BookTickets).is_ok());

        let denied = require(&customer, Capability::ManageEvents).unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn only_admins_refund() {
        let organizer = PrincipalContext::new(Principal::new(UserId::new(), Role::Organizer));
        let admin = PrincipalContext::new(Principal::new(UserId::new(), Role::Admin));
        assert!(require(&organizer, Capability::RefundPayments).is_err());
        assert!(require(&admin, Capability::RefundPayments).is_ok());
    }
}
