use async_trait::async_trait;

use crate::domain::{NewPost, Post, PostChanges};
use crate::error::RepoError;

/// Generic repository trait defining the read and delete operations every table shares.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// All entities, ordered by primary key. Empty when the table is empty.
    async fn find_all(&self) -> Result<Vec<T>, RepoError>;

    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Fails with [`RepoError::NotFound`] when no row matched.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;

    /// Total number of stored entities.
    async fn count(&self) -> Result<u64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i32> {
    /// Insert a post and return it with its assigned id and timestamps.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Replace title and content, refreshing `updated_at`.
    /// Fails with [`RepoError::NotFound`] for an unknown id.
    async fn update(&self, changes: PostChanges) -> Result<Post, RepoError>;
}
