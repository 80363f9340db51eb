use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, Entity, SupplierId};

/// Supplier status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierStatus {
    Active,
    Inactive,
}

/// Fields required to create a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A vendor the gym buys inventory from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    contact_person: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    status: SupplierStatus,
    created_at: DateTime<Utc>,
}

impl Supplier {
    pub fn create(id: SupplierId, new: NewSupplier, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.contact_person.trim().is_empty() {
            return Err(DomainError::validation("contact person cannot be empty"));
        }
        let email = new.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email is missing or malformed"));
        }

        Ok(Self {
            id,
            name: new.name.trim().to_string(),
            contact_person: new.contact_person.trim().to_string(),
            email,
            phone: new.phone,
            address: new.address,
            status: SupplierStatus::Active,
            created_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact_person(&self) -> &str {
        &self.contact_person
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn status(&self) -> SupplierStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SupplierStatus::Active
    }

    pub fn deactivate(&mut self) {
        self.status = SupplierStatus::Inactive;
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
