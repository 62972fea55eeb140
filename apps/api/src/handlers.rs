mod form;
mod health;
mod lock_batches;

pub use form::form_handler;
pub use health::health_handler;
pub use lock_batches::{lock_batch_handler, lock_batch_page_handler, lock_batch_report_handler};
