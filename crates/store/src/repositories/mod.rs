//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&FileStore` as the first argument.

pub mod detection_repo;
pub mod webhook_log_repo;

pub use detection_repo::DetectionRepo;
pub use webhook_log_repo::WebhookLogRepo;
