use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, Entity, ItemId, SaleId, UserId};

/// How a sale was paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
}

/// Sale line: owned value object, no independent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// A completed point-of-sale transaction.
///
/// Construction only validates the sale's own shape; the stock check against
/// current quantities happens in the application layer, atomically with the
/// decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    customer_id: Option<UserId>,
    processed_by: UserId,
    lines: Vec<SaleLine>,
    total_amount: u64,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
}

impl Sale {
    pub fn create(
        id: SaleId,
        customer_id: Option<UserId>,
        processed_by: UserId,
        lines: Vec<SaleLine>,
        payment_method: PaymentMethod,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("sale needs at least one line"));
        }
        for (idx, line) in lines.iter().enumerate() {
            if line.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "line {idx}: quantity must be at least 1"
                )));
            }
        }
        let mut total_amount: u64 = 0;
        for line in &lines {
            total_amount = (line.quantity as u64)
                .checked_mul(line.unit_price)
                .and_then(|amount| total_amount.checked_add(amount))
                .ok_or_else(|| DomainError::validation("sale total overflows"))?;
        }

        Ok(Self {
            id,
            customer_id,
            processed_by,
            lines,
            total_amount,
            payment_method,
            created_at,
        })
    }

    pub fn customer_id(&self) -> Option<UserId> {
        self.customer_id
    }

    pub fn processed_by(&self) -> UserId {
        self.processed_by
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
