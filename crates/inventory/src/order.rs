use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, Entity, ItemId, OrderId, SupplierId};

/// Purchase order status lifecycle.
///
/// Transitions are monotonic forward (`pending → confirmed → shipped →
/// delivered`); any non-terminal status may jump to `cancelled`.
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `next` is a legal target from this status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Cancelled {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid_transition(format!(
                "unknown status '{other}'"
            ))),
        }
    }
}

/// Purchase order line: owned value object, no independent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// An order placed with a supplier for restocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: OrderId,
    supplier_id: SupplierId,
    lines: Vec<OrderLine>,
    total_amount: u64,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    expected_delivery: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    /// Create a new order in `pending`. No stock moves at creation.
    pub fn create(
        id: OrderId,
        supplier_id: SupplierId,
        lines: Vec<OrderLine>,
        expected_delivery: Option<DateTime<Utc>>,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("purchase order needs at least one line"));
        }
        for (idx, line) in lines.iter().enumerate() {
            if line.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "line {idx}: quantity must be at least 1"
                )));
            }
        }
        let total_amount = line_total(&lines)?;

        Ok(Self {
            id,
            supplier_id,
            lines,
            total_amount,
            status: OrderStatus::Pending,
            ordered_at,
            expected_delivery,
            delivered_at: None,
        })
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn expected_delivery(&self) -> Option<DateTime<Utc>> {
        self.expected_delivery
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Move to `next`, returning whether the caller must restock the
    /// referenced items.
    ///
    /// Restocking is signalled exactly once per order: only the transition
    /// *into* `delivered` returns `true`, and `delivered` is terminal, so a
    /// retried delivery request fails here before any stock is touched.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<bool> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(format!(
                "purchase order {}: {} -> {next} is not allowed",
                self.id, self.status
            )));
        }
        self.status = next;
        if next == OrderStatus::Delivered {
            self.delivered_at = Some(now);
            return Ok(true);
        }
        Ok(false)
    }
}

impl Entity for PurchaseOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn line_total(lines: &[OrderLine]) -> DomainResult<u64> {
    let mut total: u64 = 0;
    for line in lines {
        total = (line.quantity as u64)
            .checked_mul(line.unit_price)
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| DomainError::validation("order total overflows"))?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_lines() -> Vec<OrderLine> {
        vec![
            OrderLine {
                item_id: ItemId::new(),
                quantity: 3,
                unit_price: 500,
            },
            OrderLine {
                item_id: ItemId::new(),
                quantity: 2,
                unit_price: 1200,
            },
        ]
    }

    fn test_order() -> PurchaseOrder {
        PurchaseOrder::create(OrderId::new(), SupplierId::new(), test_lines(), None, Utc::now())
            .unwrap()
    }

    #[test]
    fn create_computes_total_and_starts_pending() {
        let order = test_order();
        assert_eq!(order.total_amount(), 3 * 500 + 2 * 1200);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.delivered_at(), None);
    }

    #[test]
    fn create_rejects_empty_lines_and_zero_quantity() {
        let err =
            PurchaseOrder::create(OrderId::new(), SupplierId::new(), vec![], None, Utc::now())
                .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![OrderLine {
                item_id: ItemId::new(),
                quantity: 0,
                unit_price: 500,
            }],
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn total_overflow_is_rejected_at_creation() {
        let err = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![OrderLine {
                item_id: ItemId::new(),
                quantity: i64::MAX,
                unit_price: 1000,
            }],
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn forward_transitions_are_allowed_including_skips() {
        let mut order = test_order();
        assert!(!order.transition(OrderStatus::Confirmed, Utc::now()).unwrap());
        assert!(order.transition(OrderStatus::Delivered, Utc::now()).unwrap());
        assert!(order.delivered_at().is_some());
    }

    #[test]
    fn backward_transition_is_rejected() {
        let mut order = test_order();
        order.transition(OrderStatus::Shipped, Utc::now()).unwrap();
        let err = order.transition(OrderStatus::Pending, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn delivered_is_terminal_so_redelivery_fails() {
        let mut order = test_order();
        assert!(order.transition(OrderStatus::Delivered, Utc::now()).unwrap());
        let err = order.transition(OrderStatus::Delivered, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn cancel_is_allowed_from_any_non_terminal_status() {
        for status in [OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Shipped] {
            let mut order = test_order();
            if status != OrderStatus::Pending {
                order.transition(status, Utc::now()).unwrap();
            }
            assert!(!order.transition(OrderStatus::Cancelled, Utc::now()).unwrap());
        }

        let mut order = test_order();
        order.transition(OrderStatus::Cancelled, Utc::now()).unwrap();
        assert!(order.transition(OrderStatus::Shipped, Utc::now()).is_err());
    }

    #[test]
    fn status_serializes_with_lowercase_vocabulary() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}
