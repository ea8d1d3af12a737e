// Upload orchestration: per-file transfers, record tracking and archive links

pub mod bulk_links;
pub mod progress_tracker;
pub mod transfer_client;
pub mod upload_queue;

pub use upload_queue::{remove, submit};
