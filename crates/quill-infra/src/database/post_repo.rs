//! Post repository over SeaORM.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveModelTrait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::ActiveValue::{Set, Unchanged};

use quill_core::domain::{NewPost, Post, PostChanges};
use quill_core::error::RepoError;
use quill_core::ports::PostRepository;

use super::entity::post::{self, Entity as PostEntity};
use super::sea_orm_base::{SeaOrmRepository, map_db_err};

/// SQL-backed post repository.
pub type SeaOrmPostRepository = SeaOrmRepository<PostEntity>;

#[async_trait]
impl PostRepository for SeaOrmPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        // One clock reading for both columns keeps created_at == updated_at.
        let now: DateTimeWithTimeZone = Utc::now().into();

        let model = post::ActiveModel {
            title: Set(new_post.title),
            content: Set(new_post.content),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await
        .map_err(map_db_err)?;

        tracing::debug!(post_id = model.id, "Post created");
        Ok(model.into())
    }

    async fn update(&self, changes: PostChanges) -> Result<Post, RepoError> {
        let post_id = changes.id;

        let model = post::ActiveModel {
            id: Unchanged(changes.id),
            title: Set(changes.title),
            content: Set(changes.content),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(self.conn())
        .await
        .map_err(map_db_err)?;

        tracing::debug!(post_id, "Post updated");
        Ok(model.into())
    }
}
