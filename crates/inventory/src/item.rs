use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, Entity, ItemId, SupplierId};

/// Fields required to create an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub reorder_level: i64,
    pub supplier_id: Option<SupplierId>,
}

/// Patch applied by the update operation.
///
/// Stock is deliberately absent: `quantity` only moves through ledger
/// operations (receive, deduct, adjust).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<u64>,
    pub reorder_level: Option<i64>,
    pub supplier_id: Option<Option<SupplierId>>,
}

/// A stocked product (supplements, apparel, equipment).
///
/// Sole authority for its own stock level; `quantity` never goes negative
/// after any ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    sku: String,
    name: String,
    category: String,
    quantity: i64,
    unit_price: u64,
    reorder_level: i64,
    supplier_id: Option<SupplierId>,
    created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn create(id: ItemId, new: NewItem, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if new.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if new.reorder_level < 0 {
            return Err(DomainError::validation("reorder level cannot be negative"));
        }

        Ok(Self {
            id,
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            quantity: new.quantity,
            unit_price: new.unit_price,
            reorder_level: new.reorder_level,
            supplier_id: new.supplier_id,
            created_at,
        })
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn reorder_level(&self) -> i64 {
        self.reorder_level
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Restocking is signaled at or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Ledger operation: add received units (purchase-order delivery).
    pub fn receive(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation("received quantity must be at least 1"));
        }
        self.quantity = self.quantity.checked_add(quantity).ok_or_else(|| {
            DomainError::validation(format!("{}: received quantity overflows stock", self.name))
        })?;
        Ok(())
    }

    /// Ledger operation: remove sold units.
    ///
    /// Fails without mutating if the request exceeds current stock.
    pub fn deduct(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation("deducted quantity must be at least 1"));
        }
        if quantity > self.quantity {
            return Err(DomainError::insufficient_stock(format!(
                "{}: requested {quantity}, available {}",
                self.name, self.quantity
            )));
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Ledger operation: apply a signed manual correction.
    pub fn apply_delta(&mut self, delta: i64) -> DomainResult<()> {
        let next = self.quantity.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!(
                "{}: adjustment of {delta} overflows stock",
                self.name
            ))
        })?;
        if next < 0 {
            return Err(DomainError::insufficient_stock(format!(
                "{}: adjustment of {delta} would leave stock at {next}",
                self.name
            )));
        }
        self.quantity = next;
        Ok(())
    }

    /// Apply an update patch. Returns the previous SKU when it changed, so
    /// the caller can move the uniqueness claim.
    pub fn apply_update(&mut self, update: ItemUpdate) -> DomainResult<Option<String>> {
        let mut old_sku = None;
        if let Some(sku) = update.sku {
            let sku = sku.trim().to_string();
            if sku.is_empty() {
                return Err(DomainError::validation("sku cannot be empty"));
            }
            if sku != self.sku {
                old_sku = Some(core::mem::replace(&mut self.sku, sku));
            }
        }
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            if category.trim().is_empty() {
                return Err(DomainError::validation("category cannot be empty"));
            }
            self.category = category.trim().to_string();
        }
        if let Some(unit_price) = update.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(reorder_level) = update.reorder_level {
            if reorder_level < 0 {
                return Err(DomainError::validation("reorder level cannot be negative"));
            }
            self.reorder_level = reorder_level;
        }
        if let Some(supplier_id) = update.supplier_id {
            self.supplier_id = supplier_id;
        }
        Ok(old_sku)
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_item(quantity: i64) -> InventoryItem {
        InventoryItem::create(
            ItemId::new(),
            NewItem {
                sku: "WPX-500".to_string(),
                name: "Whey Protein 500g".to_string(),
                category: "Supplements".to_string(),
                quantity,
                unit_price: 2000,
                reorder_level: 10,
                supplier_id: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_blank_sku() {
        let err = InventoryItem::create(
            ItemId::new(),
            NewItem {
                sku: "  ".to_string(),
                name: "x".to_string(),
                category: "Apparel".to_string(),
                quantity: 0,
                unit_price: 100,
                reorder_level: 0,
                supplier_id: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deduct_beyond_stock_fails_and_leaves_quantity_untouched() {
        let mut item = test_item(5);
        let err = item.deduct(6).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(item.quantity(), 5);
    }

    #[test]
    fn deduct_to_zero_is_allowed() {
        let mut item = test_item(5);
        item.deduct(5).unwrap();
        assert_eq!(item.quantity(), 0);
        assert!(item.is_low_stock());
    }

    #[test]
    fn receive_that_overflows_stock_is_rejected() {
        let mut item = test_item(2);
        let err = item.receive(i64::MAX - 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn delta_that_overflows_stock_is_rejected() {
        let mut item = test_item(2);
        let err = item.apply_delta(i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn negative_delta_past_zero_is_rejected() {
        let mut item = test_item(3);
        assert!(item.apply_delta(-4).is_err());
        assert_eq!(item.quantity(), 3);
        item.apply_delta(-3).unwrap();
        assert_eq!(item.quantity(), 0);
    }

    #[test]
    fn sku_change_reports_previous_sku() {
        let mut item = test_item(1);
        let old = item
            .apply_update(ItemUpdate {
                sku: Some("WPX-501".to_string()),
                ..ItemUpdate::default()
            })
            .unwrap();
        assert_eq!(old.as_deref(), Some("WPX-500"));
        assert_eq!(item.sku(), "WPX-501");

        // Same SKU again is a no-op for the uniqueness claim.
        let old = item
            .apply_update(ItemUpdate {
                sku: Some("WPX-501".to_string()),
                ..ItemUpdate::default()
            })
            .unwrap();
        assert_eq!(old, None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: no sequence of ledger operations drives stock negative.
        #[test]
        fn stock_never_negative(
            initial in 0i64..1_000,
            ops in prop::collection::vec((0u8..3, 1i64..100), 1..40)
        ) {
            let mut item = test_item(initial);
            for (op, qty) in ops {
                let _ = match op {
                    0 => item.receive(qty),
                    1 => item.deduct(qty),
                    _ => item.apply_delta(-qty),
                };
                prop_assert!(item.quantity() >= 0);
            }
        }
    }
}
