//! `gymops-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod revision;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AdjustmentId, ItemId, OrderId, PlanId, SaleId, SubscriptionId, SupplierId, UserId};
pub use revision::ExpectedRevision;
