//! 缓存模块
//!
//! - MemoryCache: 进程内 TTL 缓存（注入时钟）
//! - DecisionCache: 授权决策缓存

pub mod decision_cache;
pub mod memory_cache;

pub use decision_cache::DecisionCache;
pub use memory_cache::MemoryCache;
