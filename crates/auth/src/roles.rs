use serde::{Deserialize, Serialize};

/// Closed set of roles a token may carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    Customer,
}

/// What an operation requires of its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewEvents,
    ManageEvents,
    ManageTicketTypes,
    BookTickets,
    PayBookings,
    ViewOwnBookings,
    ViewPayments,
    RefundPayments,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Customer => "customer",
        }
    }

    pub fn grants(self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::Organizer => matches!(
                capability,
                ViewEvents | ManageEvents | ManageTicketTypes | ViewOwnBookings | ViewPayments
            ),
            Role::Customer => matches!(
                capability,
                ViewEvents | BookTickets | PayBookings | ViewOwnBookings | ViewPayments
            ),
        }
    }
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewEvents => "view_events",
            Capability::ManageEvents => "manage_events",
            Capability::ManageTicketTypes => "manage_ticket_types",
            Capability::BookTickets => "book_tickets",
            Capability::PayBookings => "pay_bookings",
            Capability::ViewOwnBookings => "view_own_bookings",
            Capability::ViewPayments => "view_payments",
            Capability::RefundPayments => "refund_payments",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_everything() {
        for cap in [
            Capability::ViewEvents,
            Capability::ManageEvents,
            Capability::ManageTicketTypes,
            Capability::BookTickets,
            Capability::PayBookings,
            Capability::ViewOwnBookings,
            Capability::ViewPayments,
            Capability::RefundPayments,
        ] {
            assert!(Role::Admin.grants(cap), "{cap}");
        }
    }

    #[test]
    fn organizer_cannot_book_and_customer_cannot_manage() {
        assert!(!Role::Organizer.grants(Capability::BookTickets));
        assert!(!Role::Organizer.grants(Capability::PayBookings));
        assert!(!Role::Customer.grants(Capability::ManageEvents));
        assert!(!Role::Customer.grants(Capability::ManageTicketTypes));
        assert!(!Role::Customer.grants(Capability::RefundPayments));
    }

    #[test]
    fn roles_use_lowercase_on_the_wire() {
        let role: Role = serde_json::from_str("\"organizer\"").unwrap();
        assert_eq!(role, Role::Organizer);
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"customer\"");
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }
}
