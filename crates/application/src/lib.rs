//! Application services and ports.

#![forbid(unsafe_code)]

mod account_ports;
mod lock_batch_service;

pub use account_ports::AccountDirectory;
pub use lock_batch_service::{LockBatchService, ProcessedRow};
