//! Subscription lifecycle domain module.
//!
//! Plans, user subscriptions, and the status machine between them,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod plan;
pub mod subscription;

pub use plan::{NewPlan, Plan, PlanUpdate};
pub use subscription::{SubscriptionStatus, SubscriptionTerms, UserSubscription};
