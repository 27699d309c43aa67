use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterColumns, FilterData};
use crate::validation::FieldErrors;

/// A stored inventory record with create and partial-update payloads.
///
/// `merge` applies only the fields present in the patch; everything else is
/// left exactly as loaded.
#[async_trait]
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    type Create: DeserializeOwned + Send + Sync + 'static;
    type Patch: DeserializeOwned + Send + Sync + 'static;

    /// Human-readable name used in messages, e.g. "Accessory"
    const LABEL: &'static str;

    fn columns() -> &'static FilterColumns;

    fn validate_new(input: &Self::Create) -> Result<(), FieldErrors>;

    fn validate(&self) -> Result<(), FieldErrors>;

    fn merge(&mut self, patch: Self::Patch);

    async fn insert(pool: &PgPool, input: &Self::Create) -> Result<Self, sqlx::Error>;

    /// Write every mutable column and refresh `updated_at`. `None` when the
    /// row vanished between read and write.
    async fn write(pool: &PgPool, id: i64, record: &Self) -> Result<Option<Self>, sqlx::Error>;
}

pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    fn not_found(id: i64) -> DatabaseError {
        DatabaseError::NotFound(format!("{} {} not found", T::LABEL, id))
    }

    pub async fn select_any(&self, filter_data: &FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(T::columns())?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn count(&self, filter_data: &FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(T::columns())?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    pub async fn select_one(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(T::columns())?
            .id(id)
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.select_one(id).await?.ok_or_else(|| Self::not_found(id))
    }

    pub async fn create(&self, input: T::Create) -> Result<T, DatabaseError> {
        T::validate_new(&input).map_err(DatabaseError::Invalid)?;
        let record = T::insert(&self.pool, &input).await?;
        Ok(record)
    }

    /// Fetch, merge, validate, write. Not atomic against concurrent writers:
    /// the last write wins.
    pub async fn update(&self, id: i64, patch: T::Patch) -> Result<T, DatabaseError> {
        let mut record = self.select_404(id).await?;
        record.merge(patch);
        record.validate().map_err(DatabaseError::Invalid)?;
        T::write(&self.pool, id, &record)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Existence is checked first so a missing id never reaches `DELETE`
    pub async fn delete(&self, id: i64) -> Result<T, DatabaseError> {
        let record = self.select_404(id).await?;
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", T::columns().table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(record)
    }
}
