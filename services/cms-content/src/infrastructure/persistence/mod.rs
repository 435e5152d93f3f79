//! 持久化层模块

pub mod error_mapper;
pub mod memory_repository;
pub mod postgres_repository;

pub use memory_repository::InMemoryContentRepository;
pub use postgres_repository::{PostgresContentRepository, migrate};
