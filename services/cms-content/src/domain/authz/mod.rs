//! 授权领域：问题、决策、受控操作

mod decision;
mod operation;
mod question;

pub use decision::{Decision, VIEW_PUBLISHED};
pub use operation::GatedOperation;
pub use question::{
    ActorDescriptor, AuthorizationQuestion, ResourceAttributes, canonicalize, input_key,
};
