use crate::domain::{user::User, value_objects::*};
use crate::ports::user_repository::{InsertUserOutcome, UserRepository as UserRepositoryTrait};
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::errors::{classify, invalid_data};

/// Convert a `users` row into a `User`.
///
/// Rows that fail value-object validation are reported as backend errors;
/// the table constraints should make them impossible.
fn map_row_to_user(row: &PgRow) -> Result<User> {
    let username: String = row.try_get("username").map_err(classify)?;
    let password_hash: String = row.try_get("password_hash").map_err(classify)?;

    Ok(User {
        user_id: UserId::from_uuid(row.try_get("id").map_err(classify)?),
        username: Username::try_from(username).map_err(invalid_data)?,
        password_hash: PasswordHash::try_from(password_hash).map_err(invalid_data)?,
    })
}

/// PostgreSQL implementation of UserRepository
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    /// Insert a user, relying on the UNIQUE(username) constraint.
    ///
    /// `ON CONFLICT DO NOTHING` keeps the statement from failing, so a
    /// concurrent registration of the same name simply affects zero rows.
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(user.user_id.value())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            Ok(InsertUserOutcome::UsernameTaken)
        } else {
            Ok(InsertUserOutcome::Inserted)
        }
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id.value())
            .bind(password_hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE id = $1")
            .bind(user_id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.as_ref().map(map_row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.as_ref().map(map_row_to_user).transpose()
    }
}
