//! PostgreSQL user store.
//!
//! All queries use parameterized statements. The pool is shared across
//! all request tasks and is not locked here.

use super::{StoreError, UserStore};
use crate::models::User;
use sqlx::{Connection, PgPool};
use tracing::instrument;

/// `users` table access through a shared connection pool.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip_all, name = "us.repo.ping")]
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    #[instrument(skip_all, name = "us.repo.list_users")]
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    #[instrument(skip_all, name = "us.repo.create_user")]
    async fn create(&self, id: &str, name: &str) -> Result<String, StoreError> {
        let (stored_id,): (String,) = sqlx::query_as(
            r#"
            INSERT INTO users (id, name)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::Constraint(format!(
                        "user id already exists: {}",
                        db.message()
                    ));
                }
            }
            StoreError::Database(e)
        })?;

        Ok(stored_id)
    }

    #[instrument(skip_all, name = "us.repo.get_user")]
    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip_all, name = "us.repo.update_user")]
    async fn update_name(&self, id: &str, name: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $1
            WHERE id = $2
            "#,
        )
        .bind(name)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip_all, name = "us.repo.delete_user")]
    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
