//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod csv_lock_file;
mod http_account_directory;
mod in_memory_account_directory;

pub use csv_lock_file::{REPORT_FILE_NAME, read_lock_rows, write_lock_report};
pub use http_account_directory::{DEFAULT_REQUEST_TIMEOUT, HttpAccountDirectory};
pub use in_memory_account_directory::{InMemoryAccountDirectory, RecordedLock};
