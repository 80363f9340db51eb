//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of an inventory item.
    ItemId,
    "ItemId"
);
uuid_id!(
    /// Identifier of a supplier.
    SupplierId,
    "SupplierId"
);
uuid_id!(
    /// Identifier of a purchase order.
    OrderId,
    "OrderId"
);
uuid_id!(
    /// Identifier of a point-of-sale transaction.
    SaleId,
    "SaleId"
);
uuid_id!(
    /// Identifier of a manual stock adjustment record.
    AdjustmentId,
    "AdjustmentId"
);
uuid_id!(
    /// Identifier of a subscription plan.
    PlanId,
    "PlanId"
);
uuid_id!(
    /// Identifier of a gym member or employee (actor identity).
    UserId,
    "UserId"
);
uuid_id!(
    /// Identifier of a user subscription record.
    SubscriptionId,
    "SubscriptionId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        let id = ItemId::new();
        let parsed: ItemId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<PlanId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
