//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DbConn, DbErr};

use quill_core::ports::PostRepository;
use quill_infra::database::{self, DatabaseConfig, SeaOrmPostRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    /// The pool itself, kept for health checks and shutdown.
    pub db: Arc<DbConn>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Open the pool and wire the repository on top of it.
    pub async fn init(config: &DatabaseConfig, request_timeout: Duration) -> Result<Self, DbErr> {
        let db = database::connect(config).await?;
        Self::from_connection(db, request_timeout).await
    }

    /// Wire the repository over an existing pool, creating the posts table if needed.
    pub async fn from_connection(db: DbConn, request_timeout: Duration) -> Result<Self, DbErr> {
        let db = Arc::new(db);
        let posts = SeaOrmPostRepository::init(Arc::clone(&db)).await?;

        tracing::info!("Application state initialized");

        Ok(Self {
            posts: Arc::new(posts),
            db,
            request_timeout,
        })
    }
}
