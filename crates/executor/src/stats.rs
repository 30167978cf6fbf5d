//! Per-batch write counters.

/// Mutable counters for one batch execution.
///
/// Created at zero per batch, threaded by value through the coordinator,
/// and discarded with the response. Counters only ever increase, and only
/// from the handler that produced the corresponding successful outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Documents inserted (including index creations).
    pub inserted: u64,
    /// Documents matched by updates of existing documents.
    pub updated: u64,
    /// Documents actually changed by updates.
    pub modified: u64,
    /// Documents inserted by upserting updates.
    pub upserted: u64,
    /// Documents removed.
    pub deleted: u64,
}

impl BatchStats {
    /// Total documents affected: feeds the result's `n`.
    pub fn affected(&self) -> u64 {
        self.inserted + self.upserted + self.updated + self.deleted
    }
}
