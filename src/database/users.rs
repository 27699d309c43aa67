use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::user::{normalize_email, COLUMNS};
use crate::database::models::{NewUser, Role, UpdateUser, User};
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

const EMAIL_IN_USE: &str = "Email is already registered";

/// Account storage. Passwords arrive here already hashed.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(id: i64) -> DatabaseError {
        DatabaseError::NotFound(format!("User {} not found", id))
    }

    /// Unique violations on the email index surface as conflicts even when
    /// the pre-check raced another writer
    fn conflict_on_unique(err: sqlx::Error) -> DatabaseError {
        let err = DatabaseError::from(err);
        if err.is_unique_violation() {
            DatabaseError::Conflict(EMAIL_IN_USE.to_string())
        } else {
            err
        }
    }

    pub async fn select_any(&self, filter_data: &FilterData) -> Result<Vec<User>, DatabaseError> {
        QueryBuilder::<User>::new(&COLUMNS)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn count(&self, filter_data: &FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<User>::new(&COLUMNS)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    /// Deactivated accounts are returned too
    pub async fn select_404(&self, id: i64) -> Result<User, DatabaseError> {
        QueryBuilder::<User>::new(&COLUMNS)?
            .id(id)
            .select_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(normalize_email(email))
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Validation of `input` and the password policy happen before this call
    pub async fn insert(&self, input: &NewUser, password_hash: &str, role: Role) -> Result<User, DatabaseError> {
        let email = input.normalized_email();
        if self.email_taken(&email, None).await? {
            return Err(DatabaseError::Conflict(EMAIL_IN_USE.to_string()));
        }

        sqlx::query_as::<_, User>(
            "INSERT INTO users (full_name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(input.full_name.trim())
        .bind(&email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Self::conflict_on_unique)
    }

    pub async fn update(&self, id: i64, patch: UpdateUser) -> Result<User, DatabaseError> {
        let mut user = self.select_404(id).await?;
        let email_changed = patch
            .email
            .as_deref()
            .map(|email| normalize_email(email) != user.email)
            .unwrap_or(false);

        user.merge(patch);
        user.validate().map_err(DatabaseError::Invalid)?;

        if email_changed && self.email_taken(&user.email, Some(id)).await? {
            return Err(DatabaseError::Conflict(EMAIL_IN_USE.to_string()));
        }

        sqlx::query_as::<_, User>(
            "UPDATE users
             SET full_name = $2, email = $3, role = $4, updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::conflict_on_unique)?
        .ok_or_else(|| Self::not_found(id))
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $2, updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    /// Hard delete. Existence is checked first.
    pub async fn delete(&self, id: i64) -> Result<User, DatabaseError> {
        let user = self.select_404(id).await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(user)
    }
}
