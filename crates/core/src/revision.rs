//! Optimistic concurrency primitives.

use crate::error::{DomainError, DomainResult};

/// Revision expectation for a conditional write.
///
/// Every stored document carries a monotonically increasing revision; a
/// writer states the revision it read, and the store rejects the write if
/// another writer committed in between. This is how check-then-mutate
/// sequences (stock check before decrement, active-subscription check
/// before subscribe) stay serialized per entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// Skip revision checking (single-writer paths, sweeps).
    Any,
    /// Require the document to be at an exact revision.
    Exact(u64),
}

impl ExpectedRevision {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedRevision::Any => true,
            ExpectedRevision::Exact(r) => r == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
