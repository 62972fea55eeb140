use std::sync::Arc;

use lockdesk_domain::{IdentifierQuoting, LockOutcome, LookupDiagnostic};

use crate::account_ports::AccountDirectory;

mod batch;
mod row;

#[cfg(test)]
mod tests;

/// Application service that freezes accounts listed in an uploaded batch.
#[derive(Clone)]
pub struct LockBatchService {
    directory: Arc<dyn AccountDirectory>,
    quoting: IdentifierQuoting,
}

/// Result of processing one row, with the lookup diagnostic when there was one.
#[derive(Debug, Clone)]
pub struct ProcessedRow {
    /// Row outcome.
    pub outcome: LockOutcome,
    /// Set when the version lookup yielded nothing.
    pub diagnostic: Option<LookupDiagnostic>,
}

impl LockBatchService {
    /// Creates a lock batch service.
    #[must_use]
    pub fn new(directory: Arc<dyn AccountDirectory>, quoting: IdentifierQuoting) -> Self {
        Self { directory, quoting }
    }

    /// Returns the identifier quoting rule in use.
    #[must_use]
    pub fn quoting(&self) -> IdentifierQuoting {
        self.quoting
    }
}
