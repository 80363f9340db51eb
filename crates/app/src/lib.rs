//! `gymops-app` — application services for the gym back office.
//!
//! Orchestrates the pure domain crates over the versioned document store:
//! every logical operation of the system (item/supplier/plan CRUD, purchase
//! orders, sales, subscriptions, stats) lives here. An HTTP layer, when one
//! exists, is a thin adapter over these services.

pub mod inventory;
pub mod membership;
pub mod pagination;


pub use inventory::{InventoryService, ItemListFilter, SaleListFilter};
pub use membership::{
    MemberRecord, MembershipService, SubscriptionListFilter, SubscriptionStats,
};
pub use pagination::{paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
