//! IdGenerator trait - source of fresh region identifiers

use crate::ElementId;

/// Mints identifiers for regions that carry none.
///
/// Every call must return an identifier never returned before in this process.
pub trait IdGenerator: Send {
    /// Produce a fresh, globally unique identifier.
    fn generate(&mut self) -> ElementId;
}

impl<F> IdGenerator for F
where
    F: FnMut() -> ElementId + Send,
{
    fn generate(&mut self) -> ElementId {
        self()
    }
}
