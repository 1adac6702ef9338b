use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DbConn, DbErr, EntityTrait, Iterable, PaginatorTrait,
    PrimaryKeyToColumn, PrimaryKeyTrait, QueryOrder, Schema, SqlErr,
};

use quill_core::error::RepoError;
use quill_core::ports::BaseRepository;

/// Generic SeaORM repository implementation.
///
/// The pool is shared behind an `Arc` so the repository, health checks and
/// shutdown can all reach the same connection.
pub struct SeaOrmRepository<E>
where
    E: EntityTrait,
{
    db: Arc<DbConn>,
    _entity: PhantomData<E>,
}

impl<E> SeaOrmRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self {
            db: db.into(),
            _entity: PhantomData,
        }
    }

    /// Build the repository and make sure its table exists.
    pub async fn init(db: impl Into<Arc<DbConn>>) -> Result<Self, DbErr> {
        let repo = Self::new(db);
        repo.ensure_table().await?;
        Ok(repo)
    }

    /// Issue `CREATE TABLE IF NOT EXISTS` for the entity. Safe to call repeatedly.
    pub async fn ensure_table(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let mut stmt = Schema::new(backend).create_table_from_entity(E::default());
        stmt.if_not_exists();

        self.conn().execute(backend.build(&stmt)).await?;
        tracing::debug!(table = E::default().table_name(), "Table ensured");

        Ok(())
    }

    pub(crate) fn conn(&self) -> &DbConn {
        &self.db
    }
}

/// Classify a driver error into the repository taxonomy.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match &err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        _ => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => RepoError::Constraint(msg),
            _ => RepoError::Query(err.to_string()),
        },
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for SeaOrmRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + Send + 'static,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Send + Sync + 'static,
{
    async fn find_all(&self) -> Result<Vec<T>, RepoError> {
        let mut query = E::find();
        for key in E::PrimaryKey::iter() {
            query = query.order_by_asc(key.into_column());
        }

        let rows = query.all(self.conn()).await.map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(self.conn())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        E::find().count(self.conn()).await.map_err(map_db_err)
    }
}
