use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{AdjustmentId, DomainError, DomainResult, Entity, ItemId, UserId};

/// Direction of a manual stock correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Increase,
    Decrease,
}

/// Fields required to record an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdjustment {
    pub item_id: ItemId,
    pub adjusted_by: UserId,
    pub kind: AdjustmentKind,
    pub quantity: i64,
    pub reason: String,
    pub notes: Option<String>,
}

/// Audit record for a manual stock correction (stock counts, damaged or
/// expired goods, theft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    id: AdjustmentId,
    item_id: ItemId,
    adjusted_by: UserId,
    kind: AdjustmentKind,
    quantity: i64,
    reason: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn create(id: AdjustmentId, new: NewAdjustment, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.quantity < 1 {
            return Err(DomainError::validation("adjustment quantity must be at least 1"));
        }
        if new.reason.trim().is_empty() {
            return Err(DomainError::validation("adjustment reason cannot be empty"));
        }

        Ok(Self {
            id,
            item_id: new.item_id,
            adjusted_by: new.adjusted_by,
            kind: new.kind,
            quantity: new.quantity,
            reason: new.reason.trim().to_string(),
            notes: new.notes,
            created_at,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn adjusted_by(&self) -> UserId {
        self.adjusted_by
    }

    pub fn kind(&self) -> AdjustmentKind {
        self.kind
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The signed quantity change this adjustment applies to its item.
    pub fn signed_delta(&self) -> i64 {
        match self.kind {
            AdjustmentKind::Increase => self.quantity,
            AdjustmentKind::Decrease => -self.quantity,
        }
    }
}

impl Entity for StockAdjustment {
    type Id = AdjustmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
