//! Store error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors reported by the in-memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A test with this id already exists.
    #[error("test already exists: {0}")]
    DuplicateTest(Uuid),

    /// A slot with this id already exists.
    #[error("slot already exists: {0}")]
    DuplicateSlot(Uuid),

    /// A slot references a test other than the one being created.
    #[error("slot {slot} belongs to test {owner}, not {test}")]
    ForeignSlot { slot: Uuid, owner: Uuid, test: Uuid },

    /// Tests must be created with at least one slot.
    #[error("test {0} has no slots")]
    EmptyTest(Uuid),

    /// Update of a test that was never created.
    #[error("no such test: {0}")]
    MissingTest(Uuid),

    /// Update of a slot that was never created.
    #[error("no such slot: {0}")]
    MissingSlot(Uuid),

    /// A catalog question failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Injected failure from a `FaultyStore`.
    #[error("injected failure in {0}")]
    Injected(&'static str),
}
