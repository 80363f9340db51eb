use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, Entity, PlanId};

/// Fields required to create a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub duration_days: i64,
    pub features: Vec<String>,
    pub is_active: bool,
}

/// Patch applied by the plan update operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<u64>,
    pub duration_days: Option<i64>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// A subscription plan (e.g. Gold, Silver) members can sign up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    id: PlanId,
    name: String,
    description: Option<String>,
    price: u64,
    duration_days: i64,
    features: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Plan {
    pub fn create(id: PlanId, new: NewPlan, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("plan name cannot be empty"));
        }
        if new.duration_days < 1 {
            return Err(DomainError::validation("duration must be at least 1 day"));
        }

        Ok(Self {
            id,
            name: new.name.trim().to_string(),
            description: new.description,
            price: new.price,
            duration_days: new.duration_days,
            features: new.features,
            is_active: new.is_active,
            created_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn duration_days(&self) -> i64 {
        self.duration_days
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply an update patch. Returns the previous name when it changed, so
    /// the caller can move the uniqueness claim.
    pub fn apply_update(&mut self, update: PlanUpdate) -> DomainResult<Option<String>> {
        let mut old_name = None;
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("plan name cannot be empty"));
            }
            if name != self.name {
                old_name = Some(core::mem::replace(&mut self.name, name));
            }
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(duration_days) = update.duration_days {
            if duration_days < 1 {
                return Err(DomainError::validation("duration must be at least 1 day"));
            }
            self.duration_days = duration_days;
        }
        if let Some(features) = update.features {
            self.features = features;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        Ok(old_name)
    }
}

impl Entity for Plan {
    type Id = PlanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn test_plan(price: u64, duration_days: i64) -> Plan {
        Plan::create(
            PlanId::new(),
            NewPlan {
                name: "Gold".to_string(),
                description: None,
                price,
                duration_days,
                features: vec![],
                is_active: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_zero_duration() {
        let err = Plan::create(
            PlanId::new(),
            NewPlan {
                name: "Gold".to_string(),
                description: None,
                price: 1000,
                duration_days: 0,
                features: vec![],
                is_active: true,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn name_change_reports_previous_name() {
        let mut plan = test_plan(1000, 30);
        let old = plan
            .apply_update(PlanUpdate {
                name: Some("Platinum".to_string()),
                ..PlanUpdate::default()
            })
            .unwrap();
        assert_eq!(old.as_deref(), Some("Gold"));
    }
}
