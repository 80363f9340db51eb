//! Inventory ledger domain module.
//!
//! This crate contains the business rules for stock: items, suppliers,
//! purchase orders, sales, and manual adjustments, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod adjustment;
pub mod item;
pub mod order;
pub mod sale;
pub mod supplier;

pub use adjustment::{AdjustmentKind, NewAdjustment, StockAdjustment};
pub use item::{InventoryItem, ItemUpdate, NewItem};
pub use order::{OrderLine, OrderStatus, PurchaseOrder};
pub use sale::{PaymentMethod, Sale, SaleLine};
pub use supplier::{NewSupplier, Supplier, SupplierStatus};
