//! `gymops-store` — in-process versioned document storage.
//!
//! Collections of versioned documents with conditional (compare-and-swap)
//! updates, all-or-nothing batch writes, and explicit unique indexes.
//! Intended for tests/dev and single-process deployments; a database-backed
//! implementation would keep the same contracts.

pub mod collection;
pub mod index;

pub use collection::{Collection, Versioned};
pub use index::UniqueIndex;
