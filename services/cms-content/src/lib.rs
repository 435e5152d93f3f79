//! cms-content - 策略授权的内容服务
//!
//! 权限门、策略引擎客户端与内容发布生命周期

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
