use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, Entity, EventId, Money, TicketTypeId};

/// A priced, finite-inventory admission category for an event.
///
/// Invariant: `0 <= remaining_quantity <= total_quantity`. Quantities only move
/// through `reserve`, `release` and `resize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    id: TicketTypeId,
    event_id: EventId,
    name: String,
    price: Money,
    total_quantity: u32,
    remaining_quantity: u32,
}

/// Organizer input for a new ticket type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicketType {
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

/// Partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypePatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub total_quantity: Option<u32>,
}

/// What a `release` actually did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Units returned to the pool.
    pub restored: u32,
    /// Units dropped because the pool would have exceeded `total_quantity`.
    ///
    /// Anything non-zero means a hold was released twice somewhere upstream.
    pub excess: u32,
}

impl TicketType {
    pub fn new(
        id: TicketTypeId,
        event_id: EventId,
        name: impl Into<String>,
        price: Money,
        total_quantity: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("ticket type name cannot be empty"));
        }
        if total_quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        Ok(Self {
            id,
            event_id,
            name,
            price,
            total_quantity,
            remaining_quantity: total_quantity,
        })
    }

    pub fn from_input(id: TicketTypeId, event_id: EventId, input: NewTicketType) -> DomainResult<Self> {
        Self::new(id, event_id, input.name, input.price, input.quantity)
    }

    pub fn id_typed(&self) -> TicketTypeId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    pub fn remaining_quantity(&self) -> u32 {
        self.remaining_quantity
    }

    /// Units currently held by Pending/Confirmed bookings.
    pub fn held(&self) -> u32 {
        self.total_quantity - self.remaining_quantity
    }

    /// Check-and-decrement in one step. Leaves state untouched on failure.
    pub fn reserve(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if self.remaining_quantity < quantity {
            return Err(DomainError::InsufficientInventory {
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }

        self.remaining_quantity -= quantity;
        Ok(())
    }

    /// Return units to the pool, capped at `total_quantity`.
    pub fn release(&mut self, quantity: u32) -> ReleaseReport {
        let room = self.held();
        let restored = quantity.min(room);
        self.remaining_quantity += restored;

        ReleaseReport {
            restored,
            excess: quantity - restored,
        }
    }

    /// Change the total capacity while keeping every current hold intact.
    pub fn resize(&mut self, new_total: u32) -> DomainResult<()> {
        let held = self.held();
        if new_total < held {
            return Err(DomainError::conflict(format!(
                "cannot shrink ticket type below {held} held units"
            )));
        }

        self.total_quantity = new_total;
        self.remaining_quantity = new_total - held;
        Ok(())
    }

    /// Change the unit price. Payments already taken keep their amount.
    pub fn reprice(&mut self, price: Money) {
        self.price = price;
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("ticket type name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }

    /// Apply a patch atomically. A new total must be at least 1 and cover
    /// every held unit.
    pub fn apply(&mut self, patch: TicketTypePatch) -> DomainResult<()> {
        let mut draft = self.clone();
        if let Some(name) = patch.name {
            draft.rename(name)?;
        }
        if let Some(price) = patch.price {
            draft.reprice(price);
        }
        if let Some(total) = patch.total_quantity {
            if total == 0 {
                return Err(DomainError::validation("quantity must be at least 1"));
            }
            draft.resize(total)?;
        }

        *self = draft;
        Ok(())
    }
}

impl Entity for TicketType {
    type Id = TicketTypeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_type(total: u32) -> TicketType {
        TicketType::new(
            TicketTypeId::new(),
            EventId::new(),
            "General admission",
            Money::from_minor(5_000),
            total,
        )
        .unwrap()
    }

    #[test]
    fn new_ticket_type_starts_full() {
        let tt = ticket_type(10);
        assert_eq!(tt.total_quantity(), 10);
        assert_eq!(tt.remaining_quantity(), 10);
        assert_eq!(tt.held(), 0);
    }

    #[test]
    fn new_rejects_empty_name_and_zero_quantity() {
        let err = TicketType::new(TicketTypeId::new(), EventId::new(), " ", Money::ZERO, 5).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = TicketType::new(TicketTypeId::new(), EventId::new(), "VIP", Money::ZERO, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reserve_decrements_remaining() {
        let mut tt = ticket_type(10);
        tt.reserve(2).unwrap();
        assert_eq!(tt.remaining_quantity(), 8);
        assert_eq!(tt.held(), 2);
    }

    #[test]
    fn reserve_beyond_remaining_fails_without_side_effect() {
        let mut tt = ticket_type(10);
        let err = tt.reserve(15).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientInventory {
                requested: 15,
                remaining: 10
            }
        );
        assert_eq!(tt.remaining_quantity(), 10);
    }

    #[test]
    fn reserve_zero_is_a_validation_error() {
        let mut tt = ticket_type(10);
        assert!(matches!(tt.reserve(0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn release_is_capped_at_total() {
        let mut tt = ticket_type(10);
        tt.reserve(3).unwrap();

        let report = tt.release(5);
        assert_eq!(report, ReleaseReport { restored: 3, excess: 2 });
        assert_eq!(tt.remaining_quantity(), 10);
    }

    #[test]
    fn resize_keeps_holds() {
        let mut tt = ticket_type(10);
        tt.reserve(4).unwrap();

        tt.resize(6).unwrap();
        assert_eq!(tt.total_quantity(), 6);
        assert_eq!(tt.remaining_quantity(), 2);

        let err = tt.resize(3).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(tt.total_quantity(), 6);
    }

    #[test]
    fn reprice_only_touches_price() {
        let mut tt = ticket_type(10);
        tt.reserve(1).unwrap();
        tt.reprice(Money::from_minor(7_500));
        assert_eq!(tt.price(), Money::from_minor(7_500));
        assert_eq!(tt.remaining_quantity(), 9);
    }

    #[test]
    fn apply_patch_is_all_or_nothing() {
        let mut tt = ticket_type(10);
        tt.reserve(6).unwrap();
        let before = tt.clone();

        let err = tt
            .apply(TicketTypePatch {
                name: Some("Balcony".to_string()),
                price: None,
                total_quantity: Some(5),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(tt, before);

        tt.apply(TicketTypePatch {
            name: Some("Balcony".to_string()),
            price: Some(Money::from_minor(9_900)),
            total_quantity: Some(8),
        })
        .unwrap();
        assert_eq!(tt.name(), "Balcony");
        assert_eq!(tt.remaining_quantity(), 2);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(u32),
            Release(u32),
            Resize(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..20).prop_map(Op::Reserve),
                (0u32..20).prop_map(Op::Release),
                (0u32..40).prop_map(Op::Resize),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: no sequence of operations breaks `0 <= remaining <= total`.
            #[test]
            fn remaining_stays_within_bounds(total in 1u32..40, ops in proptest::collection::vec(op(), 0..60)) {
                let mut tt = ticket_type(total);

                for op in ops {
                    let before = tt.clone();
                    let result = match op {
                        Op::Reserve(q) => tt.reserve(q),
                        Op::Release(q) => {
                            tt.release(q);
                            Ok(())
                        }
                        Op::Resize(n) => tt.resize(n),
                    };

                    if result.is_err() {
                        prop_assert_eq!(&tt, &before);
                    }
                    prop_assert!(tt.remaining_quantity() <= tt.total_quantity());
                }
            }

            /// Property: reserve then release of the same quantity is a no-op.
            #[test]
            fn reserve_release_restores(total in 1u32..40, q in 1u32..40) {
                let mut tt = ticket_type(total);
                let before = tt.clone();
                if tt.reserve(q).is_ok() {
                    let report = tt.release(q);
                    prop_assert_eq!(report.excess, 0);
                }
                prop_assert_eq!(tt, before);
            }
        }
    }
}
