use sqlx::PgPool;

use crate::database::{Entity, Repository, UserRepository};

/// Shared per-process state handed to every handler. The pool is the only
/// shared resource.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }
}
