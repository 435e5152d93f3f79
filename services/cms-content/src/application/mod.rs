//! 应用层模块

pub mod content_service;
pub mod permission_gate;

pub use content_service::{ContentService, EditOutcome, UNPUBLISHED_NOTICE};
pub use crate::domain::entry::PublishOutcome;
pub use permission_gate::PermissionGate;
