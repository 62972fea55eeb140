//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod batch;
mod identifier;
mod lock;

pub use batch::{
    CandidateRow, INVALID_ROW_MESSAGE, LockBatchReport, LockOutcome, LockRow, LookupDiagnostic,
    RowRejection, VERSION_NOT_FOUND_MESSAGE, WorkerCount,
};
pub use identifier::{AccountRef, IdentifierQuoting, UserIdentifier};
pub use lock::{BlockedFeature, LockCustomValues, LockReceipt, LockRequest, VersionToken};
