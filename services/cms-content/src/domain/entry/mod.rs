//! 内容条目领域

mod entry;
mod repository;
mod snapshot;

pub use entry::{Entry, NewEntry, validate_contents};
pub use repository::ContentRepository;
pub use snapshot::{PublishOutcome, PublishedSnapshot};
