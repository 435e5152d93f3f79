//! 领域层
//!
//! 条目生命周期与授权问题模型。

pub mod authz;
pub mod entry;
