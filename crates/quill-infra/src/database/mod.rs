//! Storage and data access for posts.

mod connections;
mod post_repo;
mod sea_orm_base;

pub mod entity;

pub use connections::{DatabaseConfig, connect};
pub use post_repo::SeaOrmPostRepository;
pub use sea_orm_base::SeaOrmRepository;
